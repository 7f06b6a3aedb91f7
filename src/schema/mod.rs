//! Schema subsystem for docspace
//!
//! Schema descriptions arrive as loosely-typed JSON and leave as immutable
//! [`TypeDescriptor`]s.
//!
//! # Design Principles
//!
//! - Fail fast on the first violation, no partial construction
//! - Unknown fields are rejected at every nesting level
//! - Nested type references are resolved lazily, at marshalling time
//! - Deterministic, locale-free coercion

mod builder;
mod primitive;
mod types;

pub use builder::{build_type, simple_type, SchemaBuilder, ALLOWED_FIELDS};
pub use primitive::{coerce, PrimitiveType, PrimitiveValue, PropertyType};
pub use types::{
    CompoundIndex, DocumentSupport, FifoSupport, FixedProperty, IdProperty, IndexType,
    RoutingProperty, StorageType, TypeDescriptor,
};
