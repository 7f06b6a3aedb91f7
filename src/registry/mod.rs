//! Type registry
//!
//! Holds registered type descriptors keyed by type name. The registry is the
//! only shared mutable state touched by the core and is injected, never global.
//!
//! Invariants:
//! - A type name is registered at most once
//! - Check-and-insert is a single critical section
//! - Descriptors are immutable once registered

mod file;
mod memory;

use std::sync::Arc;

use crate::errors::StoreResult;
use crate::schema::TypeDescriptor;

pub use file::FileTypeRegistry;
pub use memory::InMemoryTypeRegistry;

/// Registry capability consumed by the schema builder, the marshaller and the orchestrator.
pub trait TypeRegistry: Send + Sync {
    /// Returns the descriptor registered under `type_name`
    fn get_type(&self, type_name: &str) -> Option<Arc<TypeDescriptor>>;

    /// Registers a descriptor.
    ///
    /// Fails with `TypeAlreadyRegistered` if the name is present; the check and the
    /// insert are atomic with respect to concurrent registrations.
    fn register_type(&self, descriptor: TypeDescriptor) -> StoreResult<Arc<TypeDescriptor>>;

    /// Returns all registered type names, sorted
    fn type_names(&self) -> Vec<String>;
}
