//! Where sections and their records come from.

use itemgrid_core::{AccountId, ItemsPage, SectionInfo};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("section not found: {0}")]
    SectionNotFound(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Read access to a tenant's sections. Implementations block; async
/// transports are adapted outside the engine.
pub trait RecordSource {
    fn fetch_section(&self, account: AccountId, slug: &str) -> Result<SectionInfo, SourceError>;

    fn list_records(
        &self,
        account: AccountId,
        slug: &str,
        limit: usize,
    ) -> Result<ItemsPage, SourceError>;
}

impl<T: RecordSource + ?Sized> RecordSource for &T {
    fn fetch_section(&self, account: AccountId, slug: &str) -> Result<SectionInfo, SourceError> {
        (**self).fetch_section(account, slug)
    }

    fn list_records(
        &self,
        account: AccountId,
        slug: &str,
        limit: usize,
    ) -> Result<ItemsPage, SourceError> {
        (**self).list_records(account, slug, limit)
    }
}
