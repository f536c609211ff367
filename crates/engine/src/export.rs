//! Spreadsheet export of a section's records.
//!
//! The exported column set is a superset of what is on screen: every
//! resolved column plus any data key a record carries that resolution left
//! out.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use itemgrid_core::{Column, ColumnKind, Record};
use tracing::{debug, info};

use crate::archive::{ArchiveEntry, write_archive};
use crate::collate::natural_cmp;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::package::{build_package, sheet_name};

pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A finished export, ready to be handed to whoever saves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    /// Writes the file into `dir` under its own filename.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, EngineError> {
        let path = dir.as_ref().join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        debug!(path = %path.display(), bytes = self.bytes.len(), "export written");
        Ok(path)
    }
}

/// Everything an export needs besides configuration.
#[derive(Debug, Clone, Copy)]
pub struct ExportRequest<'a> {
    pub slug: &'a str,
    pub label: &'a str,
    pub columns: &'a [Column],
    pub records: &'a [&'a Record],
}

/// Resolved columns followed by every unresolved data key, alphabetically.
/// A data key that collides with `name` or `created_at` gets its own column
/// labelled `data.<key>`.
pub fn export_columns(columns: &[Column], records: &[&Record]) -> Vec<Column> {
    let known: HashSet<&str> = columns
        .iter()
        .filter(|c| c.kind == ColumnKind::Data)
        .map(|c| c.key.as_str())
        .collect();
    let mut extra: Vec<Column> = Vec::new();
    for record in records {
        for key in record.data.keys() {
            if known.contains(key) || extra.iter().any(|c| c.key == key) {
                continue;
            }
            let label = if Column::is_reserved_key(key) {
                format!("data.{key}")
            } else {
                key.to_string()
            };
            extra.push(Column::data(key, label));
        }
    }
    extra.sort_by(|a, b| natural_cmp(&a.label, &b.label));

    let mut result = columns.to_vec();
    result.extend(extra);
    result
}

/// Text written into the cell of `record` under `column`.
pub fn cell_text(record: &Record, column: &Column) -> String {
    match column.kind {
        ColumnKind::Identity => record.name.clone(),
        ColumnKind::Timestamp => record
            .created_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default(),
        ColumnKind::Data => record
            .data
            .get(&column.key)
            .map(|v| v.to_plain_text())
            .unwrap_or_default(),
    }
}

/// Lowercased, with every run of characters outside `[a-z0-9]` collapsed to
/// a single `_` and no leading or trailing `_`.
pub fn sanitize_filename_stem(text: &str, fallback: &str) -> String {
    let mut stem = String::with_capacity(text.len());
    let mut pending_separator = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !stem.is_empty() {
                stem.push('_');
            }
            pending_separator = false;
            stem.push(c);
        } else {
            pending_separator = true;
        }
    }
    if stem.is_empty() {
        fallback.to_string()
    } else {
        stem
    }
}

/// `{stem}_{YYYY-MM-DD}.xlsx`, preferring the label over the slug.
pub fn export_filename(label: &str, slug: &str, date: DateTime<Utc>, fallback: &str) -> String {
    let source = if label.trim().is_empty() { slug } else { label };
    format!(
        "{}_{}.xlsx",
        sanitize_filename_stem(source, fallback),
        date.format("%Y-%m-%d")
    )
}

/// Builds the workbook for `request` as of `now`.
pub fn export_records(
    request: &ExportRequest<'_>,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<ExportFile, EngineError> {
    if request.records.is_empty() {
        return Err(EngineError::NothingToExport(request.slug.to_string()));
    }

    let columns = export_columns(request.columns, request.records);
    let header: Vec<String> = columns.iter().map(|c| c.label.clone()).collect();
    let rows: Vec<Vec<String>> = request
        .records
        .iter()
        .map(|record| columns.iter().map(|c| cell_text(record, c)).collect())
        .collect();

    let sheet = sheet_name(request.label, &config.default_sheet_name);
    let modified = now.naive_utc();
    let entries: Vec<ArchiveEntry> = build_package(&sheet, &header, &rows)
        .into_iter()
        .map(|part| ArchiveEntry::new(part.name, part.xml, modified))
        .collect();
    let bytes = write_archive(&entries)?;

    let filename = export_filename(request.label, request.slug, now, &config.filename_fallback);
    info!(
        filename = %filename,
        rows = rows.len(),
        columns = columns.len(),
        bytes = bytes.len(),
        "export complete"
    );
    Ok(ExportFile {
        filename,
        mime_type: config.mime_type.clone(),
        bytes,
    })
}
