//! Typed documents and the schema-driven marshaller
//!
//! A [`TypedDocument`] is created per request and owned by it until it is
//! handed to the storage collaborator or exported into a response.

mod marshaller;
mod types;

pub use marshaller::{Marshaller, DEFAULT_MAX_DEPTH};
pub use types::{DocValue, EmbeddedDocument, TypedDocument};
