//! Writer for ZIP archives made of stored (uncompressed) entries.
//!
//! Layout per entry: 30-byte local header, UTF-8 name, raw bytes. After the
//! last entry come one 46-byte central directory record per entry (each
//! followed by the name) and a 22-byte end-of-central-directory record. All
//! integers are little-endian. ZIP64 is not supported.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use thiserror::Error;

use crate::crc32::crc32;

pub const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
pub const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
pub const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50;

pub const LOCAL_HEADER_LEN: usize = 30;
pub const CENTRAL_HEADER_LEN: usize = 46;
pub const END_OF_CENTRAL_DIRECTORY_LEN: usize = 22;

const VERSION: u16 = 20;
const FLAG_UTF8_NAMES: u16 = 0x0800;
const METHOD_STORED: u16 = 0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("too many entries for a ZIP archive: {0}")]
    TooManyEntries(usize),

    #[error("entry name too long ({len} bytes): {name}")]
    NameTooLong { name: String, len: usize },

    #[error("entry too large ({size} bytes): {name}")]
    EntryTooLarge { name: String, size: usize },

    #[error("archive exceeds 4 GiB")]
    ArchiveTooLarge,
}

/// A named blob to be stored in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
    pub modified: NaiveDateTime,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>, modified: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            modified,
        }
    }
}

/// MS-DOS packed date and time as stored in ZIP headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub date: u16,
    pub time: u16,
}

impl DosDateTime {
    /// Packs `dt`, clamping to the representable 1980..=2107 range.
    /// Seconds have two-second resolution.
    pub fn from_datetime(dt: &NaiveDateTime) -> Self {
        let (date, time) = if dt.year() < 1980 {
            (NaiveDate::from_ymd_opt(1980, 1, 1), (0, 0, 0))
        } else if dt.year() > 2107 {
            (NaiveDate::from_ymd_opt(2107, 12, 31), (23, 59, 58))
        } else {
            (Some(dt.date()), (dt.hour(), dt.minute(), dt.second().min(59)))
        };
        let Some(date) = date else {
            return Self { date: 0x0021, time: 0 };
        };
        let (hour, minute, second) = time;

        let packed_date = (((date.year() - 1980) as u16) << 9)
            | ((date.month() as u16) << 5)
            | date.day() as u16;
        let packed_time = ((hour as u16) << 11) | ((minute as u16) << 5) | (second / 2) as u16;
        Self {
            date: packed_date,
            time: packed_time,
        }
    }
}

struct CentralRecord {
    name: Vec<u8>,
    crc: u32,
    size: u32,
    stamp: DosDateTime,
    offset: u32,
}

/// Accumulates entries and produces the finished archive bytes.
pub struct ArchiveWriter {
    buf: Vec<u8>,
    records: Vec<CentralRecord>,
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Appends one stored entry: local header, name, then the raw bytes.
    pub fn add(&mut self, entry: &ArchiveEntry) -> Result<(), ArchiveError> {
        if self.records.len() >= usize::from(u16::MAX) {
            return Err(ArchiveError::TooManyEntries(self.records.len() + 1));
        }
        let name = entry.name.as_bytes();
        let name_len = u16::try_from(name.len()).map_err(|_| ArchiveError::NameTooLong {
            name: entry.name.clone(),
            len: name.len(),
        })?;
        let size = u32::try_from(entry.bytes.len()).map_err(|_| ArchiveError::EntryTooLarge {
            name: entry.name.clone(),
            size: entry.bytes.len(),
        })?;
        let offset = u32::try_from(self.buf.len()).map_err(|_| ArchiveError::ArchiveTooLarge)?;
        let crc = crc32(&entry.bytes);
        let stamp = DosDateTime::from_datetime(&entry.modified);

        self.buf.reserve(LOCAL_HEADER_LEN + name.len() + entry.bytes.len());
        put_u32(&mut self.buf, LOCAL_HEADER_SIGNATURE);
        put_u16(&mut self.buf, VERSION);
        put_u16(&mut self.buf, FLAG_UTF8_NAMES);
        put_u16(&mut self.buf, METHOD_STORED);
        put_u16(&mut self.buf, stamp.time);
        put_u16(&mut self.buf, stamp.date);
        put_u32(&mut self.buf, crc);
        put_u32(&mut self.buf, size);
        put_u32(&mut self.buf, size);
        put_u16(&mut self.buf, name_len);
        put_u16(&mut self.buf, 0);
        self.buf.extend_from_slice(name);
        self.buf.extend_from_slice(&entry.bytes);

        self.records.push(CentralRecord {
            name: name.to_vec(),
            crc,
            size,
            stamp,
            offset,
        });
        Ok(())
    }

    /// Writes the central directory and end record.
    pub fn finish(mut self) -> Result<Vec<u8>, ArchiveError> {
        let cd_offset = u32::try_from(self.buf.len()).map_err(|_| ArchiveError::ArchiveTooLarge)?;

        for record in &self.records {
            put_u32(&mut self.buf, CENTRAL_HEADER_SIGNATURE);
            put_u16(&mut self.buf, VERSION); // made by
            put_u16(&mut self.buf, VERSION); // needed
            put_u16(&mut self.buf, FLAG_UTF8_NAMES);
            put_u16(&mut self.buf, METHOD_STORED);
            put_u16(&mut self.buf, record.stamp.time);
            put_u16(&mut self.buf, record.stamp.date);
            put_u32(&mut self.buf, record.crc);
            put_u32(&mut self.buf, record.size);
            put_u32(&mut self.buf, record.size);
            put_u16(&mut self.buf, record.name.len() as u16);
            put_u16(&mut self.buf, 0); // extra field length
            put_u16(&mut self.buf, 0); // comment length
            put_u16(&mut self.buf, 0); // disk number start
            put_u16(&mut self.buf, 0); // internal attributes
            put_u32(&mut self.buf, 0); // external attributes
            put_u32(&mut self.buf, record.offset);
            self.buf.extend_from_slice(&record.name);
        }

        let cd_end = u32::try_from(self.buf.len()).map_err(|_| ArchiveError::ArchiveTooLarge)?;
        let count = self.records.len() as u16;

        put_u32(&mut self.buf, END_OF_CENTRAL_DIRECTORY_SIGNATURE);
        put_u16(&mut self.buf, 0); // this disk
        put_u16(&mut self.buf, 0); // disk with central directory
        put_u16(&mut self.buf, count);
        put_u16(&mut self.buf, count);
        put_u32(&mut self.buf, cd_end - cd_offset);
        put_u32(&mut self.buf, cd_offset);
        put_u16(&mut self.buf, 0); // comment length

        Ok(self.buf)
    }
}

/// Builds an archive from `entries`, in order.
pub fn write_archive(entries: &[ArchiveEntry]) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = ArchiveWriter::new();
    for entry in entries {
        writer.add(entry)?;
    }
    writer.finish()
}

fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}
