pub mod loader;
pub mod runner;
pub mod schema;

pub use loader::{load_from_json_str, load_from_path, load_from_str, ConfigError};
pub use runner::{run_script, ScriptResult, ScriptReport};
pub use schema::{EditScript, Metadata, ScriptEdit, Settings, ValidationError, ValidationIssue};
