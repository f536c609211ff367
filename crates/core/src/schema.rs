use serde::{Deserialize, Serialize};

use crate::json_value::JsonValue;

/// Declared type of a field. Unrecognized names fall back to `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldType {
    #[default]
    String,
    Textarea,
    Select,
    Checkbox,
    Dropdown,
    Number,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Dropdown => "dropdown",
            Self::Number => "number",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "textarea" => Self::Textarea,
            "select" => Self::Select,
            "checkbox" => Self::Checkbox,
            "dropdown" => Self::Dropdown,
            "number" => Self::Number,
            _ => Self::String,
        }
    }
}

/// Typed, labeled, ordered description of one record attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub key: String,
    pub label: Option<String>,
    pub field_type: FieldType,
    pub options: Vec<String>,
    pub order: Option<i64>,
    pub show_in_table: bool,
    /// Position in the source list.
    pub index: usize,
}

impl FieldSchema {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: None,
            field_type: FieldType::String,
            options: Vec::new(),
            order: None,
            show_in_table: true,
            index: 0,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.show_in_table = false;
        self
    }

    /// The label when one is set, the key otherwise.
    pub fn display_label(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => &self.key,
        }
    }

    /// Normalizes one raw field object. Returns `None` when no key can be found.
    pub fn from_json(value: &JsonValue, index: usize) -> Option<Self> {
        value.as_object()?;
        let key = ["key", "name"]
            .iter()
            .find_map(|attr| non_empty_text(value.get(attr)?))?;
        let label = ["label", "friendlyname"]
            .iter()
            .find_map(|attr| non_empty_text(value.get(attr)?));
        let field_type = value
            .get("type")
            .and_then(JsonValue::as_str)
            .map(FieldType::parse)
            .unwrap_or_default();
        let options = value.get("options").map(parse_options).unwrap_or_default();
        let order = value.get("order").and_then(parse_order);
        let show_in_table = value.get("showInTable").and_then(JsonValue::as_bool) != Some(false);

        Some(Self {
            key,
            label,
            field_type,
            options,
            order,
            show_in_table,
            index,
        })
    }

    /// Payload form used when a field is stored as part of a template.
    pub fn to_json(&self) -> JsonValue {
        let mut entries = vec![
            ("key".to_string(), JsonValue::from(self.key.as_str())),
            ("label".to_string(), JsonValue::from(self.display_label())),
            ("type".to_string(), JsonValue::from(self.field_type.as_str())),
            (
                "options".to_string(),
                JsonValue::Array(self.options.iter().map(|o| JsonValue::from(o.as_str())).collect()),
            ),
            (
                "order".to_string(),
                self.order.map_or(JsonValue::Null, JsonValue::from),
            ),
        ];
        if !self.show_in_table {
            entries.push(("showInTable".to_string(), JsonValue::Bool(false)));
        }
        JsonValue::Object(entries)
    }
}

fn non_empty_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Options may be a list or a map of option values; both become a list of text.
fn parse_options(value: &JsonValue) -> Vec<String> {
    match value {
        JsonValue::Array(items) => items.iter().map(JsonValue::to_plain_text).collect(),
        JsonValue::Object(entries) => entries.iter().map(|(_, v)| v.to_plain_text()).collect(),
        _ => Vec::new(),
    }
}

/// Accepts integers, finite floats (truncated) and strings with a leading
/// integer. Anything else means "no explicit order".
fn parse_order(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        JsonValue::String(s) => parse_leading_int(s),
        _ => None,
    }
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Extracts field objects from `{ fields: [...] }`, `{ data: { key: {...} } }`
/// or a bare array. Fields without a key are skipped.
pub fn parse_fields(value: &JsonValue) -> Vec<FieldSchema> {
    if let Some(items) = value.as_array() {
        return fields_from_list(items);
    }
    if let Some(items) = value.get("fields").and_then(JsonValue::as_array) {
        return fields_from_list(items);
    }
    let Some(entries) = value.get("data").and_then(JsonValue::as_object) else {
        return Vec::new();
    };
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, (key, attrs))| {
            let mut merged = vec![("key".to_string(), JsonValue::from(key.as_str()))];
            if let Some(attrs) = attrs.as_object() {
                for (k, v) in attrs {
                    match merged.iter_mut().find(|(mk, _)| mk == k) {
                        Some(slot) => slot.1 = v.clone(),
                        None => merged.push((k.clone(), v.clone())),
                    }
                }
            }
            FieldSchema::from_json(&JsonValue::Object(merged), index)
        })
        .collect()
}

fn fields_from_list(items: &[JsonValue]) -> Vec<FieldSchema> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| FieldSchema::from_json(item, index))
        .collect()
}

/// A section as returned by the "get section" call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionInfo {
    pub slug: String,
    pub label: String,
    #[serde(default)]
    pub schema: JsonValue,
}

impl SectionInfo {
    pub fn new(slug: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            label: label.into(),
            schema: JsonValue::Null,
        }
    }

    pub fn with_fields(mut self, fields: &[FieldSchema]) -> Self {
        self.schema = JsonValue::Object(vec![(
            "fields".to_string(),
            JsonValue::Array(fields.iter().map(FieldSchema::to_json).collect()),
        )]);
        self
    }

    /// Declared fields; an absent or malformed schema yields none.
    pub fn fields(&self) -> Vec<FieldSchema> {
        match self.schema.get("fields") {
            Some(JsonValue::Array(items)) => fields_from_list(items),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(value: serde_json::Value) -> Option<FieldSchema> {
        FieldSchema::from_json(&JsonValue::from(value), 0)
    }

    #[test]
    fn unknown_type_defaults_to_string() {
        let f = field(json!({"key": "a", "type": "rich-text"})).unwrap();
        assert_eq!(f.field_type, FieldType::String);
        let f = field(json!({"key": "a", "type": "DropDown"})).unwrap();
        assert_eq!(f.field_type, FieldType::Dropdown);
    }

    #[test]
    fn key_falls_back_to_name_and_label_to_friendlyname() {
        let f = field(json!({"name": "amount", "friendlyname": "Amount due"})).unwrap();
        assert_eq!(f.key, "amount");
        assert_eq!(f.display_label(), "Amount due");
        assert!(field(json!({"label": "orphan"})).is_none());
        assert!(field(json!("not an object")).is_none());
    }

    #[test]
    fn order_parsing() {
        assert_eq!(field(json!({"key": "a", "order": 3})).unwrap().order, Some(3));
        assert_eq!(field(json!({"key": "a", "order": "12px"})).unwrap().order, Some(12));
        assert_eq!(field(json!({"key": "a", "order": " -4"})).unwrap().order, Some(-4));
        assert_eq!(field(json!({"key": "a", "order": 2.7})).unwrap().order, Some(2));
        assert_eq!(field(json!({"key": "a", "order": "soon"})).unwrap().order, None);
        assert_eq!(field(json!({"key": "a", "order": null})).unwrap().order, None);
        assert_eq!(field(json!({"key": "a", "order": true})).unwrap().order, None);
    }

    #[test]
    fn options_from_list_or_map() {
        let f = field(json!({"key": "s", "options": ["Ready", 2, true]})).unwrap();
        assert_eq!(f.options, vec!["Ready", "2", "true"]);
        let f = field(json!({"key": "s", "options": {"a": "Open", "b": "Closed"}})).unwrap();
        assert_eq!(f.options, vec!["Open", "Closed"]);
    }

    #[test]
    fn show_in_table_only_false_hides() {
        assert!(!field(json!({"key": "a", "showInTable": false})).unwrap().show_in_table);
        assert!(field(json!({"key": "a", "showInTable": "no"})).unwrap().show_in_table);
    }

    #[test]
    fn list_and_map_forms_agree() {
        let list = parse_fields(&JsonValue::from(json!({
            "fields": [{"key": "contact", "label": "Contact", "order": 1}]
        })));
        let map = parse_fields(&JsonValue::from(json!({
            "data": {"contact": {"label": "Contact", "order": 1}}
        })));
        assert_eq!(list, map);
    }

    #[test]
    fn section_without_schema_has_no_fields() {
        let section: SectionInfo =
            serde_json::from_str(r#"{"slug":"leads","label":"Leads"}"#).unwrap();
        assert!(section.fields().is_empty());
        let section: SectionInfo =
            serde_json::from_str(r#"{"slug":"leads","label":"Leads","schema":{"fields":"x"}}"#)
                .unwrap();
        assert!(section.fields().is_empty());
    }

    #[test]
    fn section_fields_roundtrip_through_payload() {
        let fields = vec![
            FieldSchema::new("status").with_order(2).with_index(0),
            FieldSchema::new("contact").with_label("Contact").with_order(1).with_index(1),
        ];
        let section = SectionInfo::new("leads", "Leads").with_fields(&fields);
        let parsed = section.fields();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].key, "status");
        assert_eq!(parsed[0].label.as_deref(), Some("status"));
        assert_eq!(parsed[1].display_label(), "Contact");
        assert_eq!(parsed[1].order, Some(1));
    }
}
