use itemgrid_core::ids::PreferenceScope;

use crate::error::StorageError;

/// The preference keys persisted per (account, section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKind {
    /// Raw column template JSON, as the operator saved it.
    Template,
    /// Ordered list of visible column keys.
    VisibleColumns,
    /// Desired number of on-screen columns.
    ColumnCount,
}

impl PreferenceKind {
    pub const ALL: [PreferenceKind; 3] = [Self::Template, Self::VisibleColumns, Self::ColumnCount];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::VisibleColumns => "visible-columns",
            Self::ColumnCount => "column-count",
        }
    }

    pub fn parse(s: &str) -> Result<Self, StorageError> {
        match s {
            "template" => Ok(Self::Template),
            "visible-columns" => Ok(Self::VisibleColumns),
            "column-count" => Ok(Self::ColumnCount),
            _ => Err(StorageError::Serialization(format!(
                "unknown preference kind: {s}"
            ))),
        }
    }
}

/// Keyed repository for per-section table preferences.
pub trait PreferenceStore {
    fn get_template(&self, scope: &PreferenceScope) -> Result<Option<String>, StorageError>;

    fn put_template(&mut self, scope: &PreferenceScope, raw: &str) -> Result<(), StorageError>;

    fn get_visible_columns(
        &self,
        scope: &PreferenceScope,
    ) -> Result<Option<Vec<String>>, StorageError>;

    fn put_visible_columns(
        &mut self,
        scope: &PreferenceScope,
        keys: &[String],
    ) -> Result<(), StorageError>;

    /// Stored values below 1 read back as absent.
    fn get_column_count(&self, scope: &PreferenceScope) -> Result<Option<u32>, StorageError>;

    /// Rejects a count of 0 with [`StorageError::InvalidValue`].
    fn put_column_count(&mut self, scope: &PreferenceScope, count: u32)
    -> Result<(), StorageError>;

    fn clear(&mut self, scope: &PreferenceScope, kind: PreferenceKind) -> Result<(), StorageError>;

    /// Kinds that currently hold a value for `scope`.
    fn stored_kinds(&self, scope: &PreferenceScope) -> Result<Vec<PreferenceKind>, StorageError>;
}
