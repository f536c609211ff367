use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeZone, Utc};
use itemgrid_core::{AccountId, ItemsPage, JsonValue, Record, RecordId, SectionInfo};
use itemgrid_engine::{RecordSource, SourceError};
use uuid::Uuid;

/// In-memory [`RecordSource`] serving fixed sections to any account.
#[derive(Debug, Default)]
pub struct FixtureSource {
    sections: HashMap<String, (SectionInfo, Vec<Record>)>,
    failing_sections: HashSet<String>,
    failing_records: HashSet<String>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, section: SectionInfo, records: Vec<Record>) -> Self {
        self.sections
            .insert(section.slug.clone(), (section, records));
        self
    }

    /// Section lookups for `slug` fail; records are still served.
    pub fn failing_section(mut self, slug: &str) -> Self {
        self.failing_sections.insert(slug.to_string());
        self
    }

    /// Record listings for `slug` fail.
    pub fn failing_records(mut self, slug: &str) -> Self {
        self.failing_records.insert(slug.to_string());
        self
    }
}

impl RecordSource for FixtureSource {
    fn fetch_section(&self, _account: AccountId, slug: &str) -> Result<SectionInfo, SourceError> {
        if self.failing_sections.contains(slug) {
            return Err(SourceError::Request(format!("section {slug} unavailable")));
        }
        self.sections
            .get(slug)
            .map(|(section, _)| section.clone())
            .ok_or_else(|| SourceError::SectionNotFound(slug.to_string()))
    }

    fn list_records(
        &self,
        _account: AccountId,
        slug: &str,
        limit: usize,
    ) -> Result<ItemsPage, SourceError> {
        if self.failing_records.contains(slug) {
            return Err(SourceError::Request(format!("records of {slug} unavailable")));
        }
        let items = self
            .sections
            .get(slug)
            .map(|(_, records)| records.iter().take(limit).cloned().collect())
            .unwrap_or_default();
        Ok(ItemsPage { items, next: None })
    }
}

/// Noon UTC on the given day.
pub fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// A record with a deterministic id derived from `seq`.
pub fn record(seq: u128, name: &str, fields: &[(&str, JsonValue)]) -> Record {
    let mut record = Record::new(name);
    record.id = RecordId::from_uuid(Uuid::from_u128(seq));
    for (key, value) in fields {
        record.data.insert(*key, value.clone());
    }
    record
}

/// Parses a record the way it arrives from the API.
pub fn record_from_json(value: serde_json::Value) -> Result<Record, serde_json::Error> {
    serde_json::from_value(value)
}
