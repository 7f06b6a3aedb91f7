//! Document marshaller
//!
//! Converts loosely-typed JSON property maps into [`TypedDocument`]s using a
//! registered [`TypeDescriptor`], and exports typed documents back to JSON.
//!
//! Inbound rules, per property:
//! - `null` becomes [`DocValue::Null`]
//! - Undeclared keys are kept verbatim when the type allows dynamic properties
//! - An undeclared id or routing property is implicitly declared and kept
//!   verbatim even when dynamic properties are disabled
//! - Objects marshal recursively as documents of the declared type
//! - Arrays are embedded document descriptors, copied through untyped
//! - Scalars are stringified and coerced to the declared primitive
//!
//! Recursion is bounded by `max_depth`; exceeding it is `NestingTooDeep`.

use serde_json::{Map, Value};

use crate::errors::{StoreError, StoreResult};
use crate::registry::TypeRegistry;
use crate::schema::{coerce, FixedProperty, TypeDescriptor};

use super::types::{DocValue, EmbeddedDocument, TypedDocument};

/// Default bound on nested document depth
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Schema-driven converter between JSON and typed documents
pub struct Marshaller<'a> {
    registry: &'a dyn TypeRegistry,
    max_depth: usize,
}

impl<'a> Marshaller<'a> {
    pub fn new(registry: &'a dyn TypeRegistry) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Marshals one raw property map into a document of `type_name`.
    ///
    /// Fails with `TypeNotFound` if `type_name` (or any nested type reached)
    /// is not registered.
    pub fn to_typed_document(
        &self,
        type_name: &str,
        raw: &Map<String, Value>,
    ) -> StoreResult<TypedDocument> {
        let descriptor = self.descriptor(type_name)?;
        self.marshal(&descriptor, raw, 0)
    }

    /// Marshals a write payload: a single object or an array of objects.
    ///
    /// All-or-nothing: the first failing element abandons the whole batch.
    pub fn to_typed_documents(
        &self,
        type_name: &str,
        payload: &Value,
    ) -> StoreResult<Vec<TypedDocument>> {
        let descriptor = self.descriptor(type_name)?;
        match payload {
            Value::Object(raw) => Ok(vec![self.marshal(&descriptor, raw, 0)?]),
            Value::Array(elements) => elements
                .iter()
                .enumerate()
                .map(|(index, element)| match element {
                    Value::Object(raw) => self.marshal(&descriptor, raw, 0),
                    _ => Err(StoreError::invalid_request(format!(
                        "Batch element at index [{}] is not a JSON object",
                        index
                    ))),
                })
                .collect(),
            _ => Err(StoreError::invalid_request(
                "Payload must be a JSON object or an array of JSON objects",
            )),
        }
    }

    /// Exports a document's properties, preserving order. Never fails.
    pub fn to_raw_properties(doc: &TypedDocument) -> Map<String, Value> {
        doc.to_json_map()
    }

    fn descriptor(&self, type_name: &str) -> StoreResult<std::sync::Arc<TypeDescriptor>> {
        self.registry
            .get_type(type_name)
            .ok_or_else(|| StoreError::type_not_found(type_name))
    }

    fn marshal(
        &self,
        descriptor: &TypeDescriptor,
        raw: &Map<String, Value>,
        depth: usize,
    ) -> StoreResult<TypedDocument> {
        if depth > self.max_depth {
            return Err(StoreError::nesting_too_deep(
                descriptor.type_name.as_str(),
                self.max_depth,
            ));
        }

        let mut doc = TypedDocument::new(descriptor.type_name.as_str());
        for (key, value) in raw {
            let typed = match descriptor.fixed_property(key) {
                None if is_key_property(descriptor, key) => verbatim(value),
                None => self.dynamic_value(descriptor, key, value)?,
                Some(_) if value.is_null() => DocValue::Null,
                Some(property) => self.declared_value(property, value, depth)?,
            };
            doc.insert(key.as_str(), typed);
        }
        Ok(doc)
    }

    fn dynamic_value(
        &self,
        descriptor: &TypeDescriptor,
        key: &str,
        value: &Value,
    ) -> StoreResult<DocValue> {
        if !descriptor.supports_dynamic_properties {
            return Err(StoreError::schema_validation(format!(
                "Type: {} does not support dynamic properties, undeclared property '{}'",
                descriptor.type_name, key
            )));
        }
        if value.is_null() {
            return Ok(DocValue::Null);
        }
        tracing::warn!(
            type_name = %descriptor.type_name,
            property = key,
            "no fixed property declared, storing value untyped"
        );
        Ok(DocValue::Dynamic(value.clone()))
    }

    fn declared_value(
        &self,
        property: &FixedProperty,
        value: &Value,
        depth: usize,
    ) -> StoreResult<DocValue> {
        let key = property.property_name.as_str();
        match value {
            Value::Object(nested) => {
                let nested_type = property.property_type.type_name();
                if property.property_type.is_primitive() {
                    return coerce(&value.to_string(), &property.property_type, key)
                        .map(DocValue::Primitive);
                }
                let descriptor = self.descriptor(&nested_type)?;
                Ok(DocValue::Document(self.marshal(&descriptor, nested, depth + 1)?))
            }
            Value::Array(elements) => elements
                .iter()
                .enumerate()
                .map(|(index, element)| embedded_document(key, index, element))
                .collect::<StoreResult<Vec<_>>>()
                .map(DocValue::Embedded),
            scalar => coerce(&scalar_text(scalar), &property.property_type, key)
                .map(DocValue::Primitive),
        }
    }
}

/// Id and routing properties exist on every type, declared or not
fn is_key_property(descriptor: &TypeDescriptor, key: &str) -> bool {
    key == descriptor.id_property_name() || key == descriptor.routing_property_name()
}

fn verbatim(value: &Value) -> DocValue {
    match value {
        Value::Null => DocValue::Null,
        other => DocValue::Dynamic(other.clone()),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn embedded_document(property: &str, index: usize, element: &Value) -> StoreResult<EmbeddedDocument> {
    let fail = |reason: &str| {
        StoreError::coercion_failure(property, format!("embedded document at index [{}] {}", index, reason))
    };

    let map = element.as_object().ok_or_else(|| fail("is not a JSON object"))?;
    let type_name = map
        .get("typeName")
        .and_then(Value::as_str)
        .ok_or_else(|| fail("requires a string typeName"))?;

    let version = match map.get("version") {
        None | Some(Value::Null) => 0,
        Some(v) => v
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| fail("has a non-integer version"))?,
    };
    let transient = match map.get("transient") {
        None | Some(Value::Null) => false,
        Some(v) => v.as_bool().ok_or_else(|| fail("has a non-boolean transient flag"))?,
    };
    let properties = match map.get("properties") {
        None | Some(Value::Null) => Map::new(),
        Some(v) => v
            .as_object()
            .cloned()
            .ok_or_else(|| fail("has non-object properties"))?,
    };

    Ok(EmbeddedDocument {
        type_name: type_name.to_string(),
        version,
        transient,
        properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::registry::InMemoryTypeRegistry;
    use crate::schema::{build_type, PrimitiveValue};
    use serde_json::json;

    fn registry() -> InMemoryTypeRegistry {
        let product = build_type(
            "Product",
            &json!({
                "idProperty": {"propertyName": "CatalogNumber"},
                "fixedProperties": [
                    {"propertyName": "Price", "propertyType": "float"},
                    {"propertyName": "Quantity", "propertyType": "int"},
                    {"propertyName": "nested", "propertyType": "Nested"},
                    {"propertyName": "parts", "propertyType": "Part"}
                ]
            }),
        )
        .unwrap();
        let nested = build_type("Nested", &json!({"idProperty": {"propertyName": "id"}})).unwrap();
        let strict = build_type(
            "Strict",
            &json!({"idProperty": {"propertyName": "id"}, "supportsDynamicProperties": false}),
        )
        .unwrap();
        InMemoryTypeRegistry::with_types(vec![product, nested, strict]).unwrap()
    }

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_scalars_are_coerced() {
        let registry = registry();
        let doc = Marshaller::new(&registry)
            .to_typed_document("Product", &raw(json!({"Price": "9.99", "Quantity": 3})))
            .unwrap();

        assert_eq!(doc.get("Price"), Some(&DocValue::Primitive(PrimitiveValue::Float(9.99))));
        assert_eq!(doc.get("Quantity"), Some(&DocValue::Primitive(PrimitiveValue::Int(3))));
    }

    #[test]
    fn test_dynamic_property_kept_verbatim() {
        let registry = registry();
        let doc = Marshaller::new(&registry)
            .to_typed_document("Product", &raw(json!({"Category": 42})))
            .unwrap();
        assert_eq!(doc.get("Category"), Some(&DocValue::Dynamic(json!(42))));
    }

    #[test]
    fn test_dynamic_property_rejected_when_disabled() {
        let registry = registry();
        let marshaller = Marshaller::new(&registry);

        let doc = marshaller
            .to_typed_document("Strict", &raw(json!({"id": "1"})))
            .unwrap();
        assert_eq!(doc.get("id"), Some(&DocValue::Dynamic(json!("1"))));

        let err = marshaller
            .to_typed_document("Strict", &raw(json!({"id": "1", "extra": true})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaValidation);
        assert!(err.message().contains("'extra'"));
        assert!(!err.message().contains("'id'"));
    }

    #[test]
    fn test_undeclared_routing_property_allowed_when_dynamic_disabled() {
        let registry = InMemoryTypeRegistry::with_types(vec![build_type(
            "Routed",
            &json!({
                "idProperty": {"propertyName": "id"},
                "routingProperty": {"propertyName": "region"},
                "supportsDynamicProperties": false
            }),
        )
        .unwrap()])
        .unwrap();

        let doc = Marshaller::new(&registry)
            .to_typed_document("Routed", &raw(json!({"id": 7, "region": "eu", "gone": null})));
        assert_eq!(doc.unwrap_err().kind(), ErrorKind::SchemaValidation);

        let doc = Marshaller::new(&registry)
            .to_typed_document("Routed", &raw(json!({"id": 7, "region": "eu"})))
            .unwrap();
        assert_eq!(
            Value::Object(Marshaller::to_raw_properties(&doc)),
            json!({"id": 7, "region": "eu"})
        );
    }

    #[test]
    fn test_null_is_kept() {
        let registry = registry();
        let doc = Marshaller::new(&registry)
            .to_typed_document("Product", &raw(json!({"Price": null})))
            .unwrap();
        assert_eq!(doc.get("Price"), Some(&DocValue::Null));
    }

    #[test]
    fn test_embedded_defaults() {
        let registry = registry();
        let doc = Marshaller::new(&registry)
            .to_typed_document("Product", &raw(json!({"parts": [{"typeName": "Part"}]})))
            .unwrap();
        assert_eq!(
            doc.get("parts"),
            Some(&DocValue::Embedded(vec![EmbeddedDocument {
                type_name: "Part".into(),
                version: 0,
                transient: false,
                properties: Map::new(),
            }]))
        );
    }

    #[test]
    fn test_embedded_requires_type_name() {
        let registry = registry();
        let err = Marshaller::new(&registry)
            .to_typed_document("Product", &raw(json!({"parts": [{"version": 1}]})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CoercionFailure);
        assert!(err.message().contains("parts"));
        assert!(err.message().contains("[0]"));
    }

    #[test]
    fn test_object_for_numeric_property_fails() {
        let registry = registry();
        let err = Marshaller::new(&registry)
            .to_typed_document("Product", &raw(json!({"Quantity": {"a": 1}})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CoercionFailure);
    }

    #[test]
    fn test_depth_bound() {
        let registry = registry();
        let payload = raw(json!({"nested": {"x": "1"}}));
        let err = Marshaller::new(&registry)
            .with_max_depth(0)
            .to_typed_document("Product", &payload)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NestingTooDeep);

        assert!(Marshaller::new(&registry)
            .with_max_depth(1)
            .to_typed_document("Product", &payload)
            .is_ok());
    }

    #[test]
    fn test_batch_rejects_non_objects() {
        let registry = registry();
        let marshaller = Marshaller::new(&registry);

        let err = marshaller
            .to_typed_documents("Product", &json!([{"Price": 1}, "x"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = marshaller.to_typed_documents("Product", &json!(5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_unknown_type() {
        let registry = registry();
        let err = Marshaller::new(&registry)
            .to_typed_documents("Missing", &json!({}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeNotFound);
    }
}
