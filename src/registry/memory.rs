//! In-memory type registry

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use crate::errors::{StoreError, StoreResult};
use crate::schema::TypeDescriptor;

use super::TypeRegistry;

/// Registry backed by a `RwLock<HashMap>`.
///
/// Reads share the lock; registration holds the write lock across the
/// existence check and the insert.
#[derive(Debug, Default)]
pub struct InMemoryTypeRegistry {
    types: RwLock<HashMap<String, Arc<TypeDescriptor>>>,
}

impl InMemoryTypeRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with descriptors
    pub fn with_types(descriptors: impl IntoIterator<Item = TypeDescriptor>) -> StoreResult<Self> {
        let registry = Self::new();
        for descriptor in descriptors {
            registry.register_type(descriptor)?;
        }
        Ok(registry)
    }

    /// Registers under the write lock, running `persist` on the would-be
    /// contents before the insert becomes visible.
    pub(super) fn register_with<F>(
        &self,
        descriptor: TypeDescriptor,
        persist: F,
    ) -> StoreResult<Arc<TypeDescriptor>>
    where
        F: FnOnce(&HashMap<String, Arc<TypeDescriptor>>, &TypeDescriptor) -> StoreResult<()>,
    {
        let mut types = self
            .types
            .write()
            .map_err(|_| StoreError::collaborator("RegistryPoisoned", "Type registry lock poisoned"))?;

        if types.contains_key(&descriptor.type_name) {
            return Err(StoreError::type_already_registered(&descriptor.type_name));
        }
        persist(&types, &descriptor)?;

        let descriptor = Arc::new(descriptor);
        types.insert(descriptor.type_name.clone(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Shared view of the registered types.
    ///
    /// A poisoned lock is recovered: entries are only ever added by a single
    /// insert after every check has passed, so the map is never half-updated.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<TypeDescriptor>>> {
        self.types.read().unwrap_or_else(|poisoned| {
            tracing::warn!("type registry lock poisoned, reading last consistent state");
            poisoned.into_inner()
        })
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no type is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TypeRegistry for InMemoryTypeRegistry {
    fn get_type(&self, type_name: &str) -> Option<Arc<TypeDescriptor>> {
        self.read().get(type_name).cloned()
    }

    fn register_type(&self, descriptor: TypeDescriptor) -> StoreResult<Arc<TypeDescriptor>> {
        self.register_with(descriptor, |_, _| Ok(()))
    }

    fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }
}
