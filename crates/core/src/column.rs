use std::fmt;

pub const NAME_KEY: &str = "name";
pub const CREATED_AT_KEY: &str = "created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Identity,
    Timestamp,
    Data,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Timestamp => "timestamp",
            Self::Data => "data",
        }
    }
}

/// One resolved table column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    pub key: String,
    pub label: String,
    /// Locked columns can never be hidden.
    pub locked: bool,
    pub kind: ColumnKind,
}

impl Column {
    pub fn name() -> Self {
        Self {
            key: NAME_KEY.to_string(),
            label: "Name".to_string(),
            locked: true,
            kind: ColumnKind::Identity,
        }
    }

    pub fn created_at() -> Self {
        Self {
            key: CREATED_AT_KEY.to_string(),
            label: "Date added".to_string(),
            locked: false,
            kind: ColumnKind::Timestamp,
        }
    }

    pub fn data(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            locked: false,
            kind: ColumnKind::Data,
        }
    }

    /// Keys the engine synthesizes itself; data fields may not reuse them.
    pub fn is_reserved_key(key: &str) -> bool {
        key == NAME_KEY || key == CREATED_AT_KEY
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.kind.as_str())
    }
}
