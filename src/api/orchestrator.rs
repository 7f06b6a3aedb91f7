//! Request orchestration
//!
//! Sequences every operation the same way:
//! 1. Resolve the type descriptor (or fail with `TypeNotFound`)
//! 2. Marshal or coerce inbound values
//! 3. Delegate a single call to the storage collaborator
//! 4. Export typed documents into a success envelope
//!
//! The orchestrator owns no state beyond its injected collaborators.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::document::{Marshaller, TypedDocument, DEFAULT_MAX_DEPTH};
use crate::errors::{StoreError, StoreResult};
use crate::registry::TypeRegistry;
use crate::schema::{coerce, PrimitiveValue, PropertyType, SchemaBuilder, TypeDescriptor};
use crate::storage::DocumentStore;

use super::response::Envelope;

/// Id property used by simple introduction when none is given
pub const DEFAULT_ID_PROPERTY: &str = "id";

/// Behaviour knobs for the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorOptions {
    /// Bound on nested document depth
    pub max_nesting_depth: usize,
    /// Cap applied to query reads and takes without an explicit `max`
    pub max_results: Option<usize>,
    /// Answer `{}` instead of `RecordNotFound` for a missing id
    pub empty_on_missing_record: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_DEPTH,
            max_results: None,
            empty_on_missing_record: true,
        }
    }
}

/// Boundary-facing sequencer over the registry, marshaller and store
pub struct RequestOrchestrator {
    registry: Arc<dyn TypeRegistry>,
    store: Arc<dyn DocumentStore>,
    options: OrchestratorOptions,
}

impl RequestOrchestrator {
    pub fn new(registry: Arc<dyn TypeRegistry>, store: Arc<dyn DocumentStore>) -> Self {
        Self::with_options(registry, store, OrchestratorOptions::default())
    }

    pub fn with_options(
        registry: Arc<dyn TypeRegistry>,
        store: Arc<dyn DocumentStore>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            registry,
            store,
            options,
        }
    }

    /// Returns the injected registry
    pub fn registry(&self) -> &Arc<dyn TypeRegistry> {
        &self.registry
    }

    /// Returns the orchestrator options
    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Introduces a type keyed and routed on `id_property` (default `id`)
    pub fn introduce_type_simple(
        &self,
        type_name: &str,
        id_property: Option<&str>,
    ) -> StoreResult<Envelope> {
        let id_property = id_property.unwrap_or(DEFAULT_ID_PROPERTY);
        let descriptor = SchemaBuilder::new(self.registry.as_ref()).build_simple(type_name, id_property)?;
        self.register(descriptor)
    }

    /// Introduces a type from a full schema description
    pub fn introduce_type(&self, type_name: &str, schema: &Value) -> StoreResult<Envelope> {
        let descriptor = SchemaBuilder::new(self.registry.as_ref()).build(type_name, schema)?;
        self.register(descriptor)
    }

    fn register(&self, descriptor: TypeDescriptor) -> StoreResult<Envelope> {
        let registered = self.registry.register_type(descriptor)?;
        tracing::info!(
            type_name = %registered.type_name,
            id_property = registered.id_property_name(),
            fixed_properties = registered.fixed_properties.len(),
            "type introduced"
        );
        Ok(Envelope::ok())
    }

    /// Names of all registered types
    pub fn list_types(&self) -> Envelope {
        Envelope::success(Value::from(self.registry.type_names()))
    }

    /// Reads one document by id
    pub fn get_by_id(&self, type_name: &str, id: &str) -> StoreResult<Envelope> {
        tracing::debug!(type_name, id, "read by id");
        let descriptor = self.descriptor(type_name)?;
        let typed_id = typed_id(&descriptor, id)?;
        let found = self
            .store
            .read_by_id(&descriptor, &typed_id)
            .map_err(|e| self.translate(type_name, e))?;
        self.single(type_name, id, found)
    }

    /// Reads documents matching `query` (empty or absent = all)
    pub fn get_by_query(
        &self,
        type_name: &str,
        query: Option<&str>,
        max: Option<usize>,
    ) -> StoreResult<Envelope> {
        let query = query.unwrap_or("");
        tracing::debug!(type_name, query, ?max, "read by query");
        let descriptor = self.descriptor(type_name)?;
        let docs = self
            .store
            .read_multiple(&descriptor, query, max.or(self.options.max_results))
            .map_err(|e| self.translate(type_name, e))?;
        Ok(Envelope::success(export_all(&docs)))
    }

    /// Number of stored documents of the type
    pub fn count(&self, type_name: &str) -> StoreResult<Envelope> {
        tracing::debug!(type_name, "count");
        let descriptor = self.descriptor(type_name)?;
        let count = self
            .store
            .count(&descriptor)
            .map_err(|e| self.translate(type_name, e))?;
        Ok(Envelope::success(Value::from(count)))
    }

    /// Removes one document by id, answering with the removed document
    pub fn delete_by_id(&self, type_name: &str, id: &str) -> StoreResult<Envelope> {
        tracing::debug!(type_name, id, "take by id");
        let descriptor = self.descriptor(type_name)?;
        let typed_id = typed_id(&descriptor, id)?;
        let taken = self
            .store
            .take_by_id(&descriptor, &typed_id)
            .map_err(|e| self.translate(type_name, e))?;
        self.single(type_name, id, taken)
    }

    /// Removes documents matching `query`, answering with the removed documents
    pub fn delete_by_query(
        &self,
        type_name: &str,
        query: Option<&str>,
        max: Option<usize>,
    ) -> StoreResult<Envelope> {
        let query = query.ok_or_else(|| {
            StoreError::invalid_request("Required request parameter 'query' is not present")
        })?;
        tracing::debug!(type_name, query, ?max, "take by query");
        let descriptor = self.descriptor(type_name)?;
        let docs = self
            .store
            .take_multiple(&descriptor, query, max.or(self.options.max_results))
            .map_err(|e| self.translate(type_name, e))?;
        Ok(Envelope::success(export_all(&docs)))
    }

    /// Upserts a single document or a batch; nothing is written unless every element marshals
    pub fn write(&self, type_name: &str, payload: &Value) -> StoreResult<Envelope> {
        let descriptor = self.descriptor(type_name)?;
        let documents = Marshaller::new(self.registry.as_ref())
            .with_max_depth(self.options.max_nesting_depth)
            .to_typed_documents(type_name, payload)?;

        if documents.is_empty() {
            tracing::debug!(type_name, "empty batch, nothing written");
            return Ok(Envelope::ok());
        }

        let written = documents.len();
        self.store
            .write_multiple(&descriptor, documents)
            .map_err(|e| self.translate(type_name, e))?;
        tracing::debug!(type_name, written, "batch written");
        Ok(Envelope::ok())
    }

    fn descriptor(&self, type_name: &str) -> StoreResult<Arc<TypeDescriptor>> {
        self.registry
            .get_type(type_name)
            .ok_or_else(|| StoreError::type_not_found(type_name))
    }

    fn single(&self, type_name: &str, id: &str, doc: Option<TypedDocument>) -> StoreResult<Envelope> {
        match doc {
            Some(doc) => Ok(Envelope::success(Value::Object(Marshaller::to_raw_properties(&doc)))),
            None if self.options.empty_on_missing_record => Ok(Envelope::success(Value::Object(Map::new()))),
            None => Err(StoreError::record_not_found(type_name, format!("id '{}'", id))),
        }
    }

    /// A failing collaborator call is reported as `TypeNotFound` if the type vanished meanwhile
    fn translate(&self, type_name: &str, err: StoreError) -> StoreError {
        if self.registry.get_type(type_name).is_none() {
            return StoreError::type_not_found(type_name);
        }
        tracing::warn!(type_name, error = %err, class = ?err.class(), "storage operation failed");
        err
    }
}

/// Coerces a textual id with the id property's declared type; undeclared ids are text
fn typed_id(descriptor: &TypeDescriptor, id: &str) -> StoreResult<PrimitiveValue> {
    let id_property = descriptor.id_property_name();
    match descriptor.fixed_property(id_property) {
        Some(property) => match &property.property_type {
            PropertyType::Nested(_) => Err(StoreError::unsupported_primitive(
                property.property_type.type_name(),
                id_property,
            )),
            declared => coerce(id, declared, id_property),
        },
        None => Ok(PrimitiveValue::Text(id.to_string())),
    }
}

fn export_all(docs: &[TypedDocument]) -> Value {
    Value::Array(
        docs.iter()
            .map(|doc| Value::Object(Marshaller::to_raw_properties(doc)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::registry::InMemoryTypeRegistry;
    use crate::storage::InMemoryDocumentStore;
    use serde_json::json;

    fn orchestrator() -> RequestOrchestrator {
        RequestOrchestrator::new(
            Arc::new(InMemoryTypeRegistry::new()),
            Arc::new(InMemoryDocumentStore::new()),
        )
    }

    #[test]
    fn test_typed_id_uses_declared_type() {
        let descriptor = crate::schema::build_type(
            "Order",
            &json!({
                "idProperty": {"propertyName": "orderId"},
                "fixedProperties": [{"propertyName": "orderId", "propertyType": "long"}]
            }),
        )
        .unwrap();
        assert_eq!(typed_id(&descriptor, "42").unwrap(), PrimitiveValue::Long(42));
        assert_eq!(typed_id(&descriptor, "x").unwrap_err().kind(), ErrorKind::CoercionFailure);
    }

    #[test]
    fn test_nested_id_type_is_unsupported() {
        let descriptor = crate::schema::build_type(
            "Order",
            &json!({
                "idProperty": {"propertyName": "key"},
                "fixedProperties": [{"propertyName": "key", "propertyType": "OrderKey"}]
            }),
        )
        .unwrap();
        let err = typed_id(&descriptor, "1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedPrimitiveType);
    }

    #[test]
    fn test_missing_record() {
        let orchestrator = orchestrator();
        orchestrator.introduce_type_simple("Item", None).unwrap();
        assert_eq!(
            orchestrator.get_by_id("Item", "nope").unwrap().data(),
            Some(&json!({}))
        );

        let strict = RequestOrchestrator::with_options(
            Arc::clone(orchestrator.registry()),
            Arc::new(InMemoryDocumentStore::new()),
            OrchestratorOptions {
                empty_on_missing_record: false,
                ..OrchestratorOptions::default()
            },
        );
        let err = strict.get_by_id("Item", "nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RecordNotFound);
    }

    #[test]
    fn test_delete_by_query_requires_query() {
        let orchestrator = orchestrator();
        orchestrator.introduce_type_simple("Item", None).unwrap();
        let err = orchestrator.delete_by_query("Item", None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_default_max_results() {
        let orchestrator = RequestOrchestrator::with_options(
            Arc::new(InMemoryTypeRegistry::new()),
            Arc::new(InMemoryDocumentStore::new()),
            OrchestratorOptions {
                max_results: Some(1),
                ..OrchestratorOptions::default()
            },
        );
        orchestrator.introduce_type_simple("Item", None).unwrap();
        orchestrator
            .write("Item", &json!([{"id": "a"}, {"id": "b"}]))
            .unwrap();

        let one = orchestrator.get_by_query("Item", None, None).unwrap();
        assert_eq!(one.data(), Some(&json!([{"id": "a"}])));
        let both = orchestrator.get_by_query("Item", None, Some(5)).unwrap();
        assert_eq!(both.data().and_then(Value::as_array).map(Vec::len), Some(2));
    }
}
