pub mod column;
pub mod error;
pub mod ids;
pub mod json_value;
pub mod record;
pub mod schema;
pub mod template;

pub use column::{CREATED_AT_KEY, Column, ColumnKind, NAME_KEY};
pub use error::CoreError;
pub use ids::*;
pub use json_value::JsonValue;
pub use record::{DataMap, ItemsPage, Record};
pub use schema::{FieldSchema, FieldType, SectionInfo};
pub use template::ColumnTemplate;
