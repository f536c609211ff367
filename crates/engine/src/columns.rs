//! Column resolution and visibility reconciliation.
//!
//! Data columns come from exactly one source, in priority order: the
//! section's declared schema, the operator's stored template, or keys
//! detected on the loaded records. `name` and `created_at` always lead.

use std::cmp::Ordering;
use std::collections::HashSet;

use itemgrid_core::{Column, ColumnTemplate, FieldSchema, Record};
use tracing::debug;

use crate::collate::natural_cmp;

/// Keys promoted to the front of auto-detected columns.
const PRIORITY_KEYS: [&str; 3] = ["title", "name", "label"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    Schema,
    Template,
    AutoDetected,
}

impl ColumnSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Template => "template",
            Self::AutoDetected => "auto-detected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub columns: Vec<Column>,
    pub source: ColumnSource,
}

impl ResolvedColumns {
    pub fn keys(&self) -> Vec<String> {
        all_keys(&self.columns)
    }
}

/// Resolves the ordered column list for a page of records.
pub fn resolve_columns(
    schema: &[FieldSchema],
    template: Option<&ColumnTemplate>,
    records: &[Record],
    max_auto_columns: usize,
) -> ResolvedColumns {
    let (data, source) = if !schema.is_empty() {
        (columns_from_fields(schema), ColumnSource::Schema)
    } else if let Some(template) = template.filter(|t| !t.is_empty()) {
        (columns_from_fields(&template.fields), ColumnSource::Template)
    } else {
        let columns = auto_detect_keys(records, max_auto_columns)
            .into_iter()
            .map(|key| Column::data(key.clone(), key))
            .collect();
        (columns, ColumnSource::AutoDetected)
    };

    let mut columns = Vec::with_capacity(data.len() + 2);
    columns.push(Column::name());
    columns.push(Column::created_at());
    columns.extend(data);
    debug!(
        source = source.as_str(),
        count = columns.len(),
        "resolved columns"
    );
    ResolvedColumns { columns, source }
}

/// Table-visible fields in display order.
pub fn order_fields(fields: &[FieldSchema]) -> Vec<&FieldSchema> {
    let mut visible: Vec<&FieldSchema> = fields.iter().filter(|f| f.show_in_table).collect();
    visible.sort_by(|a, b| field_order(a, b));
    visible
}

/// Explicit order first (ascending, equal orders by label), then unordered
/// fields in source position.
fn field_order(a: &FieldSchema, b: &FieldSchema) -> Ordering {
    match (a.order, b.order) {
        (Some(x), Some(y)) => x
            .cmp(&y)
            .then_with(|| compare_labels(a.display_label(), b.display_label()))
            .then_with(|| a.index.cmp(&b.index)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.index.cmp(&b.index),
    }
}

fn compare_labels(a: &str, b: &str) -> Ordering {
    natural_cmp(&a.to_lowercase(), &b.to_lowercase())
}

fn columns_from_fields(fields: &[FieldSchema]) -> Vec<Column> {
    let mut seen = HashSet::new();
    order_fields(fields)
        .into_iter()
        .filter(|f| !Column::is_reserved_key(&f.key) && seen.insert(f.key.as_str()))
        .map(|f| Column::data(f.key.clone(), f.display_label()))
        .collect()
}

/// Union of all data keys across `records`. Priority keys come first, the
/// rest follow in natural order; at most `max` keys are returned.
pub fn auto_detect_keys(records: &[Record], max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys: Vec<&str> = Vec::new();
    for record in records {
        for key in record.data.keys() {
            if !Column::is_reserved_key(key) && seen.insert(key) {
                keys.push(key);
            }
        }
    }
    keys.sort_by(|a, b| {
        let a_priority = is_priority_key(a);
        let b_priority = is_priority_key(b);
        b_priority
            .cmp(&a_priority)
            .then_with(|| natural_cmp(a, b))
    });
    keys.truncate(max);
    keys.into_iter().map(str::to_string).collect()
}

fn is_priority_key(key: &str) -> bool {
    PRIORITY_KEYS.iter().any(|p| key.eq_ignore_ascii_case(p))
}

pub fn all_keys(columns: &[Column]) -> Vec<String> {
    columns.iter().map(|c| c.key.clone()).collect()
}

/// Reconciles a stored selection against the current columns.
///
/// Keeps stored keys that still exist (first occurrence, stored order),
/// prepends any missing locked column, and falls back to every column when
/// nothing survives. Reconciling the result again returns it unchanged.
pub fn reconcile_visibility(columns: &[Column], stored: &[String]) -> Vec<String> {
    let available: HashSet<&str> = columns.iter().map(|c| c.key.as_str()).collect();
    let mut result: Vec<String> = Vec::with_capacity(stored.len());
    for key in stored {
        if available.contains(key.as_str()) && !result.contains(key) {
            result.push(key.clone());
        }
    }
    for column in columns.iter().filter(|c| c.locked) {
        if !result.contains(&column.key) {
            result.insert(0, column.key.clone());
        }
    }
    if result.is_empty() {
        debug!("visibility selection empty after reconciliation, showing all columns");
        return all_keys(columns);
    }
    result
}

/// Applies the desired column count to a selection. Locked columns are kept
/// even past the limit.
pub fn limit_visible(columns: &[Column], selection: &[String], count: usize) -> Vec<String> {
    let is_locked = |key: &str| columns.iter().any(|c| c.locked && c.key == key);
    let mut result = Vec::with_capacity(selection.len().min(count.max(1)));
    for key in selection {
        if is_locked(key) || result.len() < count {
            result.push(key.clone());
        }
    }
    if result.is_empty() {
        return selection.to_vec();
    }
    result
}
