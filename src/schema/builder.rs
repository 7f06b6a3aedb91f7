//! Schema builder: schema description JSON -> TypeDescriptor
//!
//! Validation is fail-fast and ordered:
//! 1. Top-level field allow-list
//! 2. idProperty (required)
//! 3. routingProperty
//! 4. compoundIndex
//! 5. fifoSupport, storageType
//! 6. blobStoreEnabled, supportsOptimisticLocking, supportsDynamicProperties
//! 7. fixedProperties
//! 8. Registry existence check (only after full validation)
//!
//! Unknown fields are rejected at every nesting level, never ignored.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::errors::{StoreError, StoreResult};
use crate::registry::TypeRegistry;

use super::primitive::PropertyType;
use super::types::{
    CompoundIndex, DocumentSupport, FifoSupport, FixedProperty, IdProperty, IndexType,
    RoutingProperty, StorageType, TypeDescriptor,
};

/// Fields accepted at the top level of a schema description
pub const ALLOWED_FIELDS: &[&str] = &[
    "idProperty",
    "routingProperty",
    "compoundIndex",
    "fifoSupport",
    "blobStoreEnabled",
    "storageType",
    "supportsOptimisticLocking",
    "supportsDynamicProperties",
    "fixedProperties",
];

const ID_PROPERTY_FIELDS: &[&str] = &["propertyName", "autoGenerated", "indexType"];
const ROUTING_PROPERTY_FIELDS: &[&str] = &["propertyName", "indexType"];
const COMPOUND_INDEX_FIELDS: &[&str] = &["paths", "unique"];
const FIXED_PROPERTY_FIELDS: &[&str] =
    &["propertyName", "propertyType", "documentSupport", "storageType"];

/// Builds descriptors and checks them against a registry.
pub struct SchemaBuilder<'a> {
    registry: &'a dyn TypeRegistry,
}

impl<'a> SchemaBuilder<'a> {
    /// Creates a builder backed by the given registry.
    pub fn new(registry: &'a dyn TypeRegistry) -> Self {
        Self { registry }
    }

    /// Validates `schema` and returns the descriptor for `type_name`.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found, or `TypeAlreadyRegistered`
    /// when the description is valid but the name is taken. The registry's own
    /// registration re-checks atomically.
    pub fn build(&self, type_name: &str, schema: &Value) -> StoreResult<TypeDescriptor> {
        let descriptor = build_type(type_name, schema)?;
        if self.registry.get_type(type_name).is_some() {
            return Err(StoreError::type_already_registered(type_name));
        }
        Ok(descriptor)
    }

    /// Simple introduction: id and routing on `id_property`, dynamic properties on.
    pub fn build_simple(&self, type_name: &str, id_property: &str) -> StoreResult<TypeDescriptor> {
        let descriptor = simple_type(type_name, id_property)?;
        if self.registry.get_type(type_name).is_some() {
            return Err(StoreError::type_already_registered(type_name));
        }
        Ok(descriptor)
    }
}

/// Descriptor with id and routing on `id_property` and dynamic properties enabled.
pub fn simple_type(type_name: &str, id_property: &str) -> StoreResult<TypeDescriptor> {
    check_type_name(type_name)?;
    if id_property.is_empty() {
        return Err(StoreError::schema_validation("id property name cannot be empty"));
    }
    let mut descriptor = TypeDescriptor::new(type_name, IdProperty::new(id_property));
    descriptor.routing_property = Some(RoutingProperty {
        property_name: id_property.to_string(),
        index_type: None,
    });
    descriptor.supports_dynamic_properties = true;
    Ok(descriptor)
}

/// Validates a schema description without consulting any registry.
pub fn build_type(type_name: &str, schema: &Value) -> StoreResult<TypeDescriptor> {
    check_type_name(type_name)?;

    let obj = schema
        .as_object()
        .ok_or_else(|| StoreError::schema_validation("Schema description must be a JSON object"))?;

    // 1. Top-level allow-list
    for key in obj.keys() {
        if !ALLOWED_FIELDS.contains(&key.as_str()) {
            return Err(StoreError::schema_validation(format!("Unknown field: {}", key)));
        }
    }

    // 2. idProperty
    let id_property = parse_id_property(obj.get("idProperty"))?;
    let mut descriptor = TypeDescriptor::new(type_name, id_property);

    // 3. routingProperty
    if let Some(routing) = obj.get("routingProperty") {
        descriptor.routing_property = Some(parse_routing_property(routing)?);
    }

    // 4. compoundIndex
    if let Some(compound) = obj.get("compoundIndex") {
        descriptor.compound_indexes = parse_compound_indexes(compound)?;
    }

    // 5. enumerations
    if let Some(fifo) = text_field(obj, "fifoSupport", "fifoSupport")? {
        descriptor.fifo_support = FifoSupport::from_name(fifo)
            .ok_or_else(|| illegal_value("fifoSupport", fifo))?;
    }
    if let Some(storage) = text_field(obj, "storageType", "storageType")? {
        descriptor.storage_type = StorageType::from_name(storage)
            .ok_or_else(|| illegal_value("storageType", storage))?;
    }

    // 6. flags
    if let Some(enabled) = bool_field(obj, "blobStoreEnabled", "blobStoreEnabled")? {
        descriptor.blobstore_enabled = enabled;
    }
    if let Some(locking) =
        bool_field(obj, "supportsOptimisticLocking", "supportsOptimisticLocking")?
    {
        descriptor.supports_optimistic_locking = locking;
    }
    descriptor.supports_dynamic_properties =
        bool_field(obj, "supportsDynamicProperties", "supportsDynamicProperties")?
            .unwrap_or(true);

    // 7. fixedProperties
    if let Some(fixed) = obj.get("fixedProperties") {
        descriptor.fixed_properties = parse_fixed_properties(fixed)?;
    }

    Ok(descriptor)
}

/// Path segment taken by the type listing
const RESERVED_TYPE_NAME: &str = "_types";

fn check_type_name(type_name: &str) -> StoreResult<()> {
    if type_name.trim().is_empty() {
        return Err(StoreError::schema_validation("Type name cannot be empty"));
    }
    if type_name == RESERVED_TYPE_NAME || type_name.chars().any(|c| c.is_control() || c == '/') {
        return Err(StoreError::schema_validation(format!(
            "Illegal type name: {}",
            type_name
        )));
    }
    Ok(())
}

fn parse_id_property(value: Option<&Value>) -> StoreResult<IdProperty> {
    let value = value.ok_or_else(|| StoreError::schema_validation("idProperty must be provided"))?;
    let obj = value
        .as_object()
        .ok_or_else(|| StoreError::schema_validation("idProperty value must be object"))?;
    check_fields(obj, ID_PROPERTY_FIELDS, "idProperty")?;

    let property_name = text_field(obj, "propertyName", "idProperty.propertyName")?;
    let auto_generated = bool_field(obj, "autoGenerated", "idProperty.autoGenerated")?;
    let index_type = text_field(obj, "indexType", "idProperty.indexType")?;

    let property_name = property_name
        .ok_or_else(|| StoreError::schema_validation("idProperty.propertyName must be provided"))?;

    let index_type = match (auto_generated, index_type) {
        (_, None) => None,
        (Some(_), Some(name)) => Some(parse_index_type(name, "idProperty.indexType")?),
        (None, Some(_)) => {
            return Err(StoreError::schema_validation(
                "idProperty.indexType cannot be used without idProperty.autoGenerated",
            ))
        }
    };

    Ok(IdProperty {
        property_name: property_name.to_string(),
        auto_generated,
        index_type,
    })
}

fn parse_routing_property(value: &Value) -> StoreResult<RoutingProperty> {
    let obj = value
        .as_object()
        .ok_or_else(|| StoreError::schema_validation("routingProperty value must be object"))?;
    check_fields(obj, ROUTING_PROPERTY_FIELDS, "routingProperty")?;

    let property_name = text_field(obj, "propertyName", "routingProperty.propertyName")?;
    let index_type = text_field(obj, "indexType", "routingProperty.indexType")?;

    let property_name = property_name.ok_or_else(|| {
        StoreError::schema_validation("routingProperty.propertyName must be provided")
    })?;
    let index_type = index_type
        .map(|name| parse_index_type(name, "routingProperty.indexType"))
        .transpose()?;

    Ok(RoutingProperty {
        property_name: property_name.to_string(),
        index_type,
    })
}

/// Accepts one compound index object or an array of them.
fn parse_compound_indexes(value: &Value) -> StoreResult<Vec<CompoundIndex>> {
    match value {
        Value::Array(items) => items.iter().map(parse_compound_index).collect(),
        other => Ok(vec![parse_compound_index(other)?]),
    }
}

fn parse_compound_index(value: &Value) -> StoreResult<CompoundIndex> {
    let obj = value
        .as_object()
        .ok_or_else(|| StoreError::schema_validation("compoundIndex value must be object"))?;
    check_fields(obj, COMPOUND_INDEX_FIELDS, "compoundIndex")?;

    let paths = match obj.get("paths") {
        None => return Err(StoreError::schema_validation("compoundIndex.paths must be provided")),
        Some(Value::Array(paths)) => paths,
        Some(_) => {
            return Err(StoreError::schema_validation(
                "compoundIndex.paths must be array of strings",
            ))
        }
    };
    let unique = bool_field(obj, "unique", "compoundIndex.unique")?;

    if paths.is_empty() {
        return Err(StoreError::schema_validation("compoundIndex.paths cannot be empty"));
    }
    let paths = paths
        .iter()
        .map(|p| {
            p.as_str().map(str::to_string).ok_or_else(|| {
                StoreError::schema_validation("compoundIndex.paths must be array of strings")
            })
        })
        .collect::<StoreResult<Vec<_>>>()?;

    Ok(CompoundIndex { paths, unique })
}

fn parse_fixed_properties(value: &Value) -> StoreResult<Vec<FixedProperty>> {
    let items = value
        .as_array()
        .ok_or_else(|| StoreError::schema_validation("fixedProperties must be array"))?;

    let mut names = HashSet::new();
    let mut properties = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| {
            StoreError::schema_validation(format!("FixedProperty at index [{}] must be object", i))
        })?;
        for key in obj.keys() {
            if !FIXED_PROPERTY_FIELDS.contains(&key.as_str()) {
                return Err(StoreError::schema_validation(format!(
                    "Unknown field: {} for FixedProperty at index [{}]",
                    key, i
                )));
            }
        }

        let label = |field: &str| format!("{} of FixedProperty at index [{}]", field, i);
        let property_name = text_field(obj, "propertyName", &label("propertyName"))?;
        let property_type = text_field(obj, "propertyType", &label("propertyType"))?;
        let document_support = text_field(obj, "documentSupport", &label("documentSupport"))?;
        let storage_type = text_field(obj, "storageType", &label("storageType"))?;

        let property_name = property_name.ok_or_else(|| {
            StoreError::schema_validation(format!(
                "Missing propertyName in FixedProperty at index [{}]",
                i
            ))
        })?;
        let property_type = property_type.ok_or_else(|| {
            StoreError::schema_validation(format!(
                "Missing propertyType in FixedProperty at index [{}]",
                i
            ))
        })?;
        if !names.insert(property_name) {
            return Err(StoreError::duplicate_property(property_name));
        }

        let (document_support, storage_type) = match (document_support, storage_type) {
            (None, None) => (None, None),
            (None, Some(_)) => {
                return Err(StoreError::schema_validation(
                    "Cannot apply storageType of FixedProperty without specifying documentSupport",
                ))
            }
            (Some(support), storage) => {
                let support = DocumentSupport::from_name(support)
                    .ok_or_else(|| illegal_value("fixedProperty.documentSupport", support))?;
                let storage = storage
                    .map(|s| {
                        StorageType::from_name(s)
                            .ok_or_else(|| illegal_value("fixedProperty.storageType", s))
                    })
                    .transpose()?;
                (Some(support), storage)
            }
        };

        properties.push(FixedProperty {
            property_name: property_name.to_string(),
            property_type: PropertyType::resolve(property_type)?,
            document_support,
            storage_type,
        });
    }

    Ok(properties)
}

fn check_fields(obj: &Map<String, Value>, allowed: &[&str], context: &str) -> StoreResult<()> {
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(StoreError::schema_validation(format!(
                "Unknown {} field: {}",
                context, key
            )));
        }
    }
    Ok(())
}

/// Present-and-textual check; `None` when the field is absent.
fn text_field<'v>(
    obj: &'v Map<String, Value>,
    key: &str,
    label: &str,
) -> StoreResult<Option<&'v str>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(StoreError::schema_validation(format!("{} must be textual", label))),
    }
}

fn bool_field(obj: &Map<String, Value>, key: &str, label: &str) -> StoreResult<Option<bool>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(StoreError::schema_validation(format!("{} must be boolean", label))),
    }
}

fn parse_index_type(name: &str, label: &str) -> StoreResult<IndexType> {
    IndexType::from_name(name).ok_or_else(|| illegal_value(label, name))
}

fn illegal_value(label: &str, value: &str) -> StoreError {
    StoreError::schema_validation(format!("Illegal {}: {}", label, value))
}
