//! Cross-module behavior of the mutation engine and editing sessions.

mod mutation_properties;
mod session_rollback;
