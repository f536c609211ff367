use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A dynamically typed value held in a record's `data` map.
///
/// Objects keep their keys in insertion order so that canonical JSON text
/// matches what the API sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum JsonValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<JsonValue>),
    Object(Vec<(String, JsonValue)>),
}

impl JsonValue {
    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, JsonValue::Number(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            JsonValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[JsonValue]> {
        match self {
            JsonValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, JsonValue)]> {
        match self {
            JsonValue::Object(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up `key` when this value is an object.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Compact JSON text, keys in insertion order.
    pub fn to_json_text(&self) -> String {
        self.to_value().to_string()
    }

    /// Plain text form used for cells and text comparison.
    ///
    /// `null` becomes the empty string, containers become their JSON text.
    pub fn to_plain_text(&self) -> String {
        match self {
            JsonValue::Null => String::new(),
            JsonValue::Bool(b) => b.to_string(),
            JsonValue::Number(n) => number_text(n),
            JsonValue::String(s) => s.clone(),
            JsonValue::Array(_) | JsonValue::Object(_) => self.to_json_text(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.clone()),
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::Array(items.iter().map(JsonValue::to_value).collect()),
            JsonValue::Object(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (k, v) in entries {
                    map.insert(k.clone(), v.to_value());
                }
                Value::Object(map)
            }
        }
    }
}

/// Integral floats print without a fractional part, like a JavaScript number.
fn number_text(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(b),
            Value::Number(n) => JsonValue::Number(n),
            Value::String(s) => JsonValue::String(s),
            Value::Array(items) => JsonValue::Array(items.into_iter().map(JsonValue::from).collect()),
            Value::Object(map) => {
                JsonValue::Object(map.into_iter().map(|(k, v)| (k, JsonValue::from(v))).collect())
            }
        }
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        value.to_value()
    }
}

impl From<&str> for JsonValue {
    fn from(s: &str) -> Self {
        JsonValue::String(s.to_string())
    }
}

impl From<String> for JsonValue {
    fn from(s: String) -> Self {
        JsonValue::String(s)
    }
}

impl From<bool> for JsonValue {
    fn from(b: bool) -> Self {
        JsonValue::Bool(b)
    }
}

impl From<i64> for JsonValue {
    fn from(n: i64) -> Self {
        JsonValue::Number(n.into())
    }
}

/// Non-finite floats have no JSON form and become `null`.
impl From<f64> for JsonValue {
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_of_scalars() {
        assert_eq!(JsonValue::Null.to_plain_text(), "");
        assert_eq!(JsonValue::from(true).to_plain_text(), "true");
        assert_eq!(JsonValue::from(42i64).to_plain_text(), "42");
        assert_eq!(JsonValue::from(2.5).to_plain_text(), "2.5");
        assert_eq!(JsonValue::from(3.0).to_plain_text(), "3");
        assert_eq!(JsonValue::from("hi").to_plain_text(), "hi");
    }

    #[test]
    fn containers_render_as_compact_json_in_key_order() {
        let value = JsonValue::from(json!({"z": 1, "a": [true, null, "x"]}));
        assert_eq!(value.to_plain_text(), r#"{"z":1,"a":[true,null,"x"]}"#);
    }

    #[test]
    fn get_finds_object_member() {
        let value = JsonValue::from(json!({"k": "v"}));
        assert_eq!(value.get("k"), Some(&JsonValue::from("v")));
        assert_eq!(value.get("missing"), None);
        assert_eq!(JsonValue::from(1i64).get("k"), None);
    }

    #[test]
    fn nan_becomes_null() {
        assert!(JsonValue::from(f64::NAN).is_null());
    }

    #[test]
    fn serde_roundtrip_preserves_order() {
        let text = r#"{"b":1,"a":{"y":2,"x":3}}"#;
        let value: JsonValue = serde_json::from_str(text).unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), text);
    }
}
