//! Storage collaborator for docspace
//!
//! The store holds documents and executes queries. The core only talks to it
//! through [`DocumentStore`]; every call is a single opaque operation with no
//! internal retry.
//!
//! # Design Principles
//!
//! - Operations are scoped by a registered [`TypeDescriptor`]
//! - Writes are upserts keyed by the descriptor's id property
//! - Failures surface as `Collaborator` errors carrying a class name

mod memory;
mod query;

use crate::document::TypedDocument;
use crate::errors::StoreResult;
use crate::schema::{PrimitiveValue, TypeDescriptor};

pub use memory::InMemoryDocumentStore;
pub use query::{Condition, Operator, Predicate};

/// Operations the core requires from a storage engine
pub trait DocumentStore: Send + Sync {
    /// Reads the document with the given id
    fn read_by_id(
        &self,
        descriptor: &TypeDescriptor,
        id: &PrimitiveValue,
    ) -> StoreResult<Option<TypedDocument>>;

    /// Reads up to `max` documents matching `query` (empty = all)
    fn read_multiple(
        &self,
        descriptor: &TypeDescriptor,
        query: &str,
        max: Option<usize>,
    ) -> StoreResult<Vec<TypedDocument>>;

    /// Removes and returns the document with the given id
    fn take_by_id(
        &self,
        descriptor: &TypeDescriptor,
        id: &PrimitiveValue,
    ) -> StoreResult<Option<TypedDocument>>;

    /// Removes and returns up to `max` documents matching `query`
    fn take_multiple(
        &self,
        descriptor: &TypeDescriptor,
        query: &str,
        max: Option<usize>,
    ) -> StoreResult<Vec<TypedDocument>>;

    /// Writes or replaces documents by id, all or nothing
    fn write_multiple(
        &self,
        descriptor: &TypeDescriptor,
        documents: Vec<TypedDocument>,
    ) -> StoreResult<()>;

    /// Number of stored documents of the type
    fn count(&self, descriptor: &TypeDescriptor) -> StoreResult<usize>;
}
