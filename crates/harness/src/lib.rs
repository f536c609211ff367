pub mod fixtures;
pub mod workspace;

pub use fixtures::{FixtureSource, day, record, record_from_json};
pub use workspace::TestWorkspace;
