//! Element addressing.
//!
//! Addresses name elements by ancestry and same-tag sibling position, or by
//! `id` when the element carries one. Nothing is cached between calls: every
//! address is resolved again against the current document text.
//!
//! Positional addresses are not stable across edits that change an
//! ancestor's children (a morph or a link wrap shifts later ordinals). The
//! resolver compensates for the wrap case with a single retry.

pub mod codec;
pub mod errors;
pub mod resolver;

pub use codec::{Address, Step};
pub use errors::AddressError;
pub use resolver::{resolve, Resolution};
