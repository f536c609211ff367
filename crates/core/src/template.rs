use crate::error::CoreError;
use crate::json_value::JsonValue;
use crate::schema::{FieldSchema, FieldType, parse_fields};

/// A user-authored column override for one section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnTemplate {
    pub name: Option<String>,
    pub fields: Vec<FieldSchema>,
}

impl ColumnTemplate {
    /// Normalizes a raw template value. Fields come out ordered by explicit
    /// `order`, unordered fields last in source position.
    pub fn from_json(value: &JsonValue) -> Self {
        let name = value
            .get("name")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
        let mut fields = parse_fields(value);
        fields.sort_by_key(|f| (f.order.is_none(), f.order, f.index));
        Self { name, fields }
    }

    /// Parses stored template text.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let value: JsonValue = serde_json::from_str(raw)?;
        match value {
            JsonValue::Object(_) | JsonValue::Array(_) => Ok(Self::from_json(&value)),
            _ => Err(CoreError::InvalidTemplate(
                "template must be a JSON object or array".into(),
            )),
        }
    }

    /// Template that mirrors a section's declared schema, for pre-filling the
    /// template editor. `None` when the schema declares nothing.
    pub fn from_schema(slug: &str, fields: &[FieldSchema]) -> Option<Self> {
        if fields.is_empty() {
            return None;
        }
        Some(Self {
            name: Some(if slug.is_empty() { "template" } else { slug }.to_string()),
            fields: fields.to_vec(),
        })
    }

    /// The example shown next to the template editor.
    pub fn sample() -> Self {
        Self {
            name: Some("template".to_string()),
            fields: vec![
                FieldSchema::new("contact")
                    .with_label("Contact")
                    .with_order(1),
                FieldSchema::new("amount")
                    .with_label("Amount")
                    .with_type(FieldType::Number)
                    .with_order(2)
                    .with_index(1),
                FieldSchema::new("status")
                    .with_label("Status")
                    .with_type(FieldType::Dropdown)
                    .with_order(3)
                    .with_options(["Ready", "Done", "In Progress"])
                    .with_index(2),
            ],
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(vec![
            (
                "name".to_string(),
                JsonValue::from(self.name.as_deref().unwrap_or("template")),
            ),
            (
                "fields".to_string(),
                JsonValue::Array(self.fields.iter().map(FieldSchema::to_json).collect()),
            ),
        ])
    }

    pub fn to_json_text(&self) -> String {
        self.to_json().to_json_text()
    }
}
