//! File-backed type registry
//!
//! Registered descriptors survive restarts:
//! - Stored at `<data_dir>/types.json`, one JSON array of descriptors
//! - Loaded once at startup; a malformed file fails startup
//! - Rewritten (temp file + rename) inside the registration critical section

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{StoreError, StoreResult};
use crate::schema::TypeDescriptor;

use super::memory::InMemoryTypeRegistry;
use super::TypeRegistry;

const REGISTRY_FILE: &str = "types.json";
const IO_ERROR_CLASS: &str = "TypeRegistryIo";

/// Registry that persists every registration before making it visible.
#[derive(Debug)]
pub struct FileTypeRegistry {
    path: PathBuf,
    inner: InMemoryTypeRegistry,
}

impl FileTypeRegistry {
    /// Opens the registry under `data_dir`, loading previously registered types.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        if !data_dir.exists() {
            fs::create_dir_all(data_dir).map_err(|e| {
                io_error(data_dir, format!("Failed to create data directory: {}", e))
            })?;
        }

        let path = data_dir.join(REGISTRY_FILE);
        let inner = InMemoryTypeRegistry::new();

        if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| io_error(&path, format!("Failed to read file: {}", e)))?;
            let descriptors: Vec<TypeDescriptor> = serde_json::from_str(&content)
                .map_err(|e| io_error(&path, format!("Invalid JSON: {}", e)))?;
            for descriptor in descriptors {
                inner.register_type(descriptor)?;
            }
        }

        tracing::info!(path = %path.display(), types = inner.len(), "type registry loaded");
        Ok(Self { path, inner })
    }

    /// Returns the registry file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TypeRegistry for FileTypeRegistry {
    fn get_type(&self, type_name: &str) -> Option<Arc<TypeDescriptor>> {
        self.inner.get_type(type_name)
    }

    fn register_type(&self, descriptor: TypeDescriptor) -> StoreResult<Arc<TypeDescriptor>> {
        let path = &self.path;
        self.inner.register_with(descriptor, |existing, added| {
            let mut all: Vec<&TypeDescriptor> = existing.values().map(Arc::as_ref).collect();
            all.push(added);
            all.sort_by(|a, b| a.type_name.cmp(&b.type_name));

            let content = serde_json::to_string_pretty(&all)
                .map_err(|e| io_error(path, format!("Failed to serialize types: {}", e)))?;

            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, content)
                .map_err(|e| io_error(&tmp, format!("Failed to write file: {}", e)))?;
            fs::rename(&tmp, path)
                .map_err(|e| io_error(path, format!("Failed to replace file: {}", e)))
        })
    }

    fn type_names(&self) -> Vec<String> {
        self.inner.type_names()
    }
}

fn io_error(path: &Path, reason: String) -> StoreError {
    StoreError::collaborator(IO_ERROR_CLASS, format!("{}: {}", path.display(), reason))
}
