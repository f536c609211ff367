use itemgrid_core::CoreError;
use itemgrid_storage::StorageError;
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("record source error: {0}")]
    Source(#[from] SourceError),

    #[error("nothing to export in section: {0}")]
    NothingToExport(String),

    #[error("template has no fields")]
    EmptyTemplate,

    #[error("invalid column count: {0}")]
    InvalidColumnCount(i64),

    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
