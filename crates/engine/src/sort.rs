//! On-screen row ordering.

use std::cmp::Ordering;

use itemgrid_core::{CREATED_AT_KEY, JsonValue, NAME_KEY, Record};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collate::natural_cmp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Newest first for the timestamp column, ascending everywhere else.
    pub fn default_for(key: &str) -> Self {
        if key == CREATED_AT_KEY {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self::new(CREATED_AT_KEY)
    }
}

impl SortState {
    /// Sorting on `key` in its default direction.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let direction = SortDirection::default_for(&key);
        Self { key, direction }
    }

    /// State after a click on the header of `key`.
    pub fn toggle(&self, key: &str) -> Self {
        if self.key == key {
            Self {
                key: self.key.clone(),
                direction: self.direction.flipped(),
            }
        } else {
            Self::new(key)
        }
    }

    /// Falls back to the first visible column when the active one is hidden.
    pub fn ensure_visible(&self, visible: &[String]) -> Self {
        if visible.iter().any(|k| *k == self.key) {
            return self.clone();
        }
        match visible.first() {
            Some(first) => {
                debug!(from = %self.key, to = %first, "sort column hidden, falling back");
                Self::new(first.as_str())
            }
            None => self.clone(),
        }
    }
}

/// Ascending comparison of two records on `key`.
pub fn compare_records(a: &Record, b: &Record, key: &str) -> Ordering {
    match key {
        NAME_KEY => natural_cmp(&a.name, &b.name),
        // `None < Some`, so a missing timestamp is the oldest.
        CREATED_AT_KEY => a.created_at.cmp(&b.created_at),
        _ => compare_values(a.data.get(key), b.data.get(key)),
    }
}

/// Sort key of one data cell: blanks, then numbers, then text.
#[derive(Debug, Clone)]
enum CellKey {
    Blank,
    Number(f64),
    Text(String),
}

impl CellKey {
    fn of(value: Option<&JsonValue>) -> Self {
        let Some(value) = value else {
            return Self::Blank;
        };
        if let Some(n) = value.as_f64() {
            return Self::Number(n);
        }
        let text = value.to_plain_text();
        if text.is_empty() {
            return Self::Blank;
        }
        match text.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(text),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Blank => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

impl Ord for CellKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => natural_cmp(a, b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for CellKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CellKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellKey {}

fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    CellKey::of(a).cmp(&CellKey::of(b))
}

/// Stable ordering of `records` under `state`. The input is left untouched.
pub fn sort_records<'a>(records: &'a [Record], state: &SortState) -> Vec<&'a Record> {
    let mut sorted: Vec<&Record> = records.iter().collect();
    sorted.sort_by(|a, b| {
        let ordering = compare_records(a, b, &state.key);
        match state.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn names<'a>(records: &[&'a Record]) -> Vec<&'a str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    fn at(day: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn default_state_is_newest_first() {
        let state = SortState::default();
        assert_eq!(state.key, "created_at");
        assert_eq!(state.direction, SortDirection::Desc);
    }

    #[test]
    fn clicking_flips_or_activates() {
        let state = SortState::default();
        let flipped = state.toggle("created_at");
        assert_eq!(flipped.direction, SortDirection::Asc);

        let other = flipped.toggle("amount");
        assert_eq!(other, SortState { key: "amount".into(), direction: SortDirection::Asc });
        assert_eq!(other.toggle("amount").direction, SortDirection::Desc);
        assert_eq!(other.toggle("created_at").direction, SortDirection::Desc);
    }

    #[test]
    fn hidden_sort_column_falls_back_to_first_visible() {
        let state = SortState::new("amount").toggle("amount");
        let visible = vec!["name".to_string(), "status".to_string()];
        assert_eq!(state.ensure_visible(&visible), SortState::new("name"));
        assert_eq!(state.ensure_visible(&["amount".to_string()]), state);
        assert_eq!(state.ensure_visible(&[]), state);
    }

    #[test]
    fn names_sort_naturally() {
        let records = vec![Record::new("item 10"), Record::new("item 9"), Record::new("Item 1")];
        let sorted = sort_records(&records, &SortState::new("name"));
        assert_eq!(names(&sorted), vec!["Item 1", "item 9", "item 10"]);
        assert_eq!(records[0].name, "item 10");
    }

    #[test]
    fn missing_timestamp_is_oldest() {
        let records = vec![
            Record::new("old").with_created_at(at(1)),
            Record::new("none"),
            Record::new("new").with_created_at(at(2)),
        ];
        let sorted = sort_records(&records, &SortState::default());
        assert_eq!(names(&sorted), vec!["new", "old", "none"]);
    }

    #[test]
    fn numeric_text_sorts_with_numbers() {
        let records = vec![
            Record::new("a").with_field("amount", 10i64),
            Record::new("b").with_field("amount", 9.5),
            Record::new("c"),
            Record::new("d").with_field("amount", "8"),
            Record::new("e").with_field("amount", "n/a"),
            Record::new("f").with_field("amount", JsonValue::Null),
        ];
        let sorted = sort_records(&records, &SortState::new("amount"));
        assert_eq!(names(&sorted), vec!["c", "f", "d", "b", "a", "e"]);

        let numeric = vec![
            Record::new("x").with_field("amount", 100i64),
            Record::new("y").with_field("amount", 20i64),
        ];
        let sorted = sort_records(&numeric, &SortState::new("amount"));
        assert_eq!(names(&sorted), vec!["y", "x"]);
    }

    #[test]
    fn negative_numbers_and_numeric_text_do_not_cycle() {
        let records = vec![
            Record::new("four").with_field("v", "4"),
            Record::new("three").with_field("v", 3i64),
            Record::new("minus five").with_field("v", -5i64),
        ];
        let key = |name: &str| records.iter().find(|r| r.name == name).unwrap();
        assert_eq!(compare_records(key("minus five"), key("three"), "v"), Ordering::Less);
        assert_eq!(compare_records(key("three"), key("four"), "v"), Ordering::Less);
        assert_eq!(compare_records(key("minus five"), key("four"), "v"), Ordering::Less);

        let sorted = sort_records(&records, &SortState::new("v"));
        assert_eq!(names(&sorted), vec!["minus five", "three", "four"]);
    }

    #[test]
    fn flipping_created_at_reverses_exactly() {
        let records: Vec<Record> = (1..=5)
            .map(|d| Record::new(format!("r{d}")).with_created_at(at(d)))
            .collect();
        let desc = sort_records(&records, &SortState::default());
        let mut asc = sort_records(&records, &SortState::default().toggle("created_at"));
        asc.reverse();
        assert_eq!(names(&desc), names(&asc));
    }

    proptest! {
        #[test]
        fn sort_is_stable_and_repeatable(values in prop::collection::vec(0u8..4, 0..20)) {
            let records: Vec<Record> = values
                .iter()
                .enumerate()
                .map(|(i, v)| Record::new(format!("r{i}")).with_field("bucket", i64::from(*v)))
                .collect();
            let state = SortState::new("bucket");
            let once = sort_records(&records, &state);
            let twice = sort_records(&records, &state);
            prop_assert_eq!(names(&once), names(&twice));

            // equal buckets keep input order
            for pair in once.windows(2) {
                let a = pair[0].data.get("bucket").and_then(JsonValue::as_f64);
                let b = pair[1].data.get("bucket").and_then(JsonValue::as_f64);
                if a == b {
                    let ia: usize = pair[0].name[1..].parse().unwrap();
                    let ib: usize = pair[1].name[1..].parse().unwrap();
                    prop_assert!(ia < ib);
                }
            }
        }

        #[test]
        fn mixed_cells_sort_in_a_total_order(cells in prop::collection::vec(mixed_cell(), 0..12)) {
            let records: Vec<Record> = cells
                .iter()
                .enumerate()
                .map(|(i, cell)| match cell {
                    Some(value) => Record::new(format!("r{i}")).with_field("v", value.clone()),
                    None => Record::new(format!("r{i}")),
                })
                .collect();

            for a in &records {
                for b in &records {
                    prop_assert_eq!(compare_records(a, b, "v"), compare_records(b, a, "v").reverse());
                    for c in &records {
                        if compare_records(a, b, "v") != Ordering::Greater
                            && compare_records(b, c, "v") != Ordering::Greater
                        {
                            prop_assert_ne!(compare_records(a, c, "v"), Ordering::Greater);
                        }
                    }
                }
            }

            for state in [SortState::new("v"), SortState::new("v").toggle("v")] {
                let once = sort_records(&records, &state);
                let twice = sort_records(&records, &state);
                prop_assert_eq!(names(&once), names(&twice));
                for pair in once.windows(2) {
                    let ordering = compare_records(pair[0], pair[1], "v");
                    match state.direction {
                        SortDirection::Asc => { prop_assert_ne!(ordering, Ordering::Greater); }
                        SortDirection::Desc => { prop_assert_ne!(ordering, Ordering::Less); }
                    }
                }
            }
        }
    }

    fn mixed_cell() -> impl Strategy<Value = Option<JsonValue>> {
        prop_oneof![
            (-50i64..50).prop_map(|n| Some(JsonValue::from(n))),
            (-50.0f64..50.0).prop_map(|n| Some(JsonValue::from(n))),
            (-50i64..50).prop_map(|n| Some(JsonValue::from(n.to_string()))),
            "[a-z0-9 #-]{0,5}".prop_map(|s| Some(JsonValue::from(s))),
            Just(Some(JsonValue::Null)),
            Just(None),
        ]
    }
}
