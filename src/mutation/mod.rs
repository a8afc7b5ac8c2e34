//! The mutation engine: resolve an address, apply a typed edit, return the
//! whole document.

pub mod applicator;
pub mod engine;
pub mod errors;
pub mod fields;
pub mod frame;

pub use engine::{apply, Engine, EngineOptions, MutationOutcome, MutationStatus};
pub use errors::{MutationError, UnsupportedField};
pub use fields::{AttributeField, CropPosition, ElementEdit, FieldEdit, ImageFrame, ObjectFit};
pub use frame::SizingMode;
