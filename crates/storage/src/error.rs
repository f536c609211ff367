use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid preference value: {0}")]
    InvalidValue(String),

    #[error("core error: {0}")]
    Core(#[from] itemgrid_core::CoreError),
}
