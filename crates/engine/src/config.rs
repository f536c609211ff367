use serde::Deserialize;

use crate::export::XLSX_MIME_TYPE;

/// Tunables for a [`TableEngine`](crate::TableEngine).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on data columns found by scanning records.
    pub max_auto_columns: usize,
    /// Records requested per page.
    pub page_limit: usize,
    pub mime_type: String,
    /// Filename stem used when a section has no usable label or slug.
    pub filename_fallback: String,
    pub default_sheet_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_auto_columns: 8,
            page_limit: 200,
            mime_type: XLSX_MIME_TYPE.to_string(),
            filename_fallback: "section".to_string(),
            default_sheet_name: "Sheet1".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn with_max_auto_columns(mut self, max: usize) -> Self {
        self.max_auto_columns = max;
        self
    }

    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_filename_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.filename_fallback = fallback.into();
        self
    }

    pub fn with_default_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.default_sheet_name = name.into();
        self
    }
}
