pub mod archive;
pub mod collate;
pub mod columns;
pub mod config;
pub mod crc32;
pub mod error;
pub mod export;
pub mod package;
pub mod sort;
pub mod source;

pub use columns::{ColumnSource, ResolvedColumns};
pub use config::EngineConfig;
pub use error::EngineError;
pub use export::{ExportFile, XLSX_MIME_TYPE};
pub use sort::{SortDirection, SortState};
pub use source::{RecordSource, SourceError};

use chrono::{DateTime, Utc};
use itemgrid_core::{
    AccountId, Column, ColumnTemplate, PreferenceScope, Record, SectionInfo,
};
use itemgrid_storage::{PreferenceKind, PreferenceStore, SqliteStorage, StorageError};
use tracing::{debug, info, warn};

use crate::columns::{limit_visible, reconcile_visibility, resolve_columns};
use crate::export::{ExportRequest, export_records};
use crate::sort::sort_records;

/// One loaded page of a section, with everything needed to render it.
#[derive(Debug, Clone)]
pub struct TableView {
    pub scope: PreferenceScope,
    pub section: SectionInfo,
    pub records: Vec<Record>,
    pub columns: Vec<Column>,
    pub source: ColumnSource,
    /// Reconciled visibility selection, in display order.
    pub visible: Vec<String>,
    pub column_count: Option<u32>,
    pub sort: SortState,
}

impl TableView {
    /// Keys actually on screen: the selection with the column-count hint
    /// applied.
    pub fn displayed_keys(&self) -> Vec<String> {
        match self.column_count {
            Some(count) => limit_visible(&self.columns, &self.visible, count as usize),
            None => self.visible.clone(),
        }
    }

    pub fn visible_columns(&self) -> Vec<&Column> {
        self.displayed_keys()
            .iter()
            .filter_map(|key| self.columns.iter().find(|c| &c.key == key))
            .collect()
    }

    pub fn sorted_records(&self) -> Vec<&Record> {
        sort_records(&self.records, &self.sort)
    }

    /// Applies a click on the header of `key`.
    pub fn click_header(&mut self, key: &str) {
        self.sort = self.sort.toggle(key);
    }

    fn refresh_sort(&mut self) {
        self.sort = self.sort.ensure_visible(&self.displayed_keys());
    }
}

/// Drives a table of records: column resolution against stored preferences,
/// on-screen sorting and spreadsheet export.
pub struct TableEngine<S: RecordSource> {
    source: S,
    storage: SqliteStorage,
    config: EngineConfig,
}

impl<S: RecordSource> TableEngine<S> {
    pub fn new(source: S, storage: SqliteStorage) -> Self {
        Self::with_config(source, storage, EngineConfig::default())
    }

    pub fn with_config(source: S, storage: SqliteStorage, config: EngineConfig) -> Self {
        Self {
            source,
            storage,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut SqliteStorage {
        &mut self.storage
    }

    pub fn into_parts(self) -> (S, SqliteStorage, EngineConfig) {
        (self.source, self.storage, self.config)
    }

    /// Section metadata, or a bare section labelled by its slug when the
    /// source cannot provide it.
    fn section_or_fallback(&self, account: AccountId, slug: &str) -> SectionInfo {
        match self.source.fetch_section(account, slug) {
            Ok(section) => section,
            Err(e) => {
                warn!(slug, error = %e, "section fetch failed, continuing without schema");
                SectionInfo::new(slug, slug)
            }
        }
    }

    /// The stored template, if one exists and parses.
    fn stored_template(&self, scope: &PreferenceScope) -> Result<Option<ColumnTemplate>, EngineError> {
        let Some(raw) = self.storage.get_template(scope)? else {
            return Ok(None);
        };
        match ColumnTemplate::parse(&raw) {
            Ok(template) => Ok(Some(template)),
            Err(e) => {
                warn!(%scope, error = %e, "ignoring malformed stored template");
                Ok(None)
            }
        }
    }

    fn stored_selection(&self, scope: &PreferenceScope) -> Result<Option<Vec<String>>, EngineError> {
        match self.storage.get_visible_columns(scope) {
            Ok(selection) => Ok(selection),
            Err(StorageError::Serialization(e)) => {
                warn!(%scope, error = %e, "ignoring unreadable column selection");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads one page of `slug` and resolves its columns, visibility and
    /// initial sort.
    pub fn load_view(&self, account: AccountId, slug: &str) -> Result<TableView, EngineError> {
        let scope = PreferenceScope::new(account, slug);
        let section = self.section_or_fallback(account, slug);
        let page = self
            .source
            .list_records(account, slug, self.config.page_limit)?;

        let template = self.stored_template(&scope)?;
        let resolved = resolve_columns(
            &section.fields(),
            template.as_ref(),
            &page.items,
            self.config.max_auto_columns,
        );

        let visible = match self.stored_selection(&scope)? {
            Some(stored) if !stored.is_empty() => reconcile_visibility(&resolved.columns, &stored),
            _ => resolved.keys(),
        };
        let column_count = self.storage.get_column_count(&scope)?;

        let mut view = TableView {
            scope,
            section,
            records: page.items,
            columns: resolved.columns,
            source: resolved.source,
            visible,
            column_count,
            sort: SortState::default(),
        };
        view.refresh_sort();
        debug!(
            scope = %view.scope,
            records = view.records.len(),
            columns = view.columns.len(),
            visible = view.visible.len(),
            "view loaded"
        );
        Ok(view)
    }

    /// Persists a new visibility selection for `view`, reconciled against
    /// its columns, and returns what was stored.
    pub fn save_visible_columns(
        &mut self,
        view: &mut TableView,
        keys: &[String],
    ) -> Result<Vec<String>, EngineError> {
        let selection = reconcile_visibility(&view.columns, keys);
        self.storage.put_visible_columns(&view.scope, &selection)?;
        info!(scope = %view.scope, count = selection.len(), "visible columns saved");
        view.visible = selection.clone();
        view.refresh_sort();
        Ok(selection)
    }

    /// Validates and stores a column template for `slug`. Visibility is reset
    /// to every column the template produces.
    pub fn save_template(
        &mut self,
        account: AccountId,
        slug: &str,
        raw: &str,
    ) -> Result<ColumnTemplate, EngineError> {
        let scope = PreferenceScope::new(account, slug);
        let template = ColumnTemplate::parse(raw)?.with_name(scope.section());
        if template.is_empty() {
            return Err(EngineError::EmptyTemplate);
        }

        self.storage.put_template(&scope, &template.to_json_text())?;
        let keys = resolve_columns(&[], Some(&template), &[], self.config.max_auto_columns).keys();
        self.storage.put_visible_columns(&scope, &keys)?;
        info!(%scope, fields = template.fields.len(), "template saved");
        Ok(template)
    }

    /// Stores the desired number of on-screen columns. Counts below 1 are
    /// rejected.
    pub fn save_column_count(
        &mut self,
        account: AccountId,
        slug: &str,
        count: i64,
    ) -> Result<u32, EngineError> {
        let count = u32::try_from(count)
            .ok()
            .filter(|c| *c > 0)
            .ok_or(EngineError::InvalidColumnCount(count))?;
        let scope = PreferenceScope::new(account, slug);
        self.storage.put_column_count(&scope, count)?;
        info!(%scope, count, "column count saved");
        Ok(count)
    }

    /// Text to pre-fill the template editor with: the stored template, else
    /// one derived from the section schema, else the built-in sample.
    pub fn template_editor_text(&self, account: AccountId, slug: &str) -> Result<String, EngineError> {
        let scope = PreferenceScope::new(account, slug);
        if let Some(raw) = self.storage.get_template(&scope)? {
            if !raw.trim().is_empty() {
                return Ok(raw);
            }
        }
        let section = self.section_or_fallback(account, slug);
        let template = ColumnTemplate::from_schema(scope.section(), &section.fields())
            .unwrap_or_else(ColumnTemplate::sample);
        Ok(template.to_json_text())
    }

    /// Drops every stored preference for `slug`.
    pub fn reset_preferences(&mut self, account: AccountId, slug: &str) -> Result<(), EngineError> {
        let scope = PreferenceScope::new(account, slug);
        let kinds = self.storage.stored_kinds(&scope)?;
        for kind in &kinds {
            self.storage.clear(&scope, *kind)?;
        }
        info!(
            %scope,
            cleared = ?kinds.iter().map(PreferenceKind::as_str).collect::<Vec<_>>(),
            "preferences reset"
        );
        Ok(())
    }

    pub fn export(&self, view: &TableView) -> Result<ExportFile, EngineError> {
        self.export_at(view, Utc::now())
    }

    /// Exports `view` in its current sort order, dated `now`.
    pub fn export_at(&self, view: &TableView, now: DateTime<Utc>) -> Result<ExportFile, EngineError> {
        let records = view.sorted_records();
        let request = ExportRequest {
            slug: view.scope.section(),
            label: &view.section.label,
            columns: &view.columns,
            records: &records,
        };
        export_records(&request, &self.config, now)
    }
}
