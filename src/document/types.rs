//! Typed document values

use serde_json::{Map, Value};

use crate::schema::PrimitiveValue;

/// A typed property value
#[derive(Debug, Clone, PartialEq)]
pub enum DocValue {
    /// Explicit JSON null
    Null,
    /// Value coerced to a declared primitive
    Primitive(PrimitiveValue),
    /// Undeclared property stored verbatim
    Dynamic(Value),
    /// Nested document of a registered type
    Document(TypedDocument),
    /// Pre-typed embedded documents, copied through as received
    Embedded(Vec<EmbeddedDocument>),
}

impl DocValue {
    /// Exports the value as JSON. Never fails.
    pub fn to_json(&self) -> Value {
        match self {
            DocValue::Null => Value::Null,
            DocValue::Primitive(p) => p.to_json(),
            DocValue::Dynamic(v) => v.clone(),
            DocValue::Document(doc) => Value::Object(doc.to_json_map()),
            DocValue::Embedded(docs) => {
                Value::Array(docs.iter().map(EmbeddedDocument::to_json).collect())
            }
        }
    }

    /// Resolves a dotted path below this value
    fn lookup(&self, path: &[&str]) -> Option<Value> {
        let Some((head, rest)) = path.split_first() else {
            return Some(self.to_json());
        };
        match self {
            DocValue::Document(doc) => doc.get(head)?.lookup(rest),
            DocValue::Dynamic(value) => {
                let mut current = value.get(*head)?;
                for segment in rest {
                    current = current.get(*segment)?;
                }
                Some(current.clone())
            }
            _ => None,
        }
    }
}

impl From<PrimitiveValue> for DocValue {
    fn from(value: PrimitiveValue) -> Self {
        DocValue::Primitive(value)
    }
}

/// A named, ordered mapping from property name to typed value
#[derive(Debug, Clone, PartialEq)]
pub struct TypedDocument {
    type_name: String,
    properties: Vec<(String, DocValue)>,
}

impl TypedDocument {
    /// Creates an empty document of the given type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: Vec::new(),
        }
    }

    /// Returns the document's type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the value of a top-level property
    pub fn get(&self, name: &str) -> Option<&DocValue> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Sets a property, keeping its original position if it already exists
    pub fn insert(&mut self, name: impl Into<String>, value: DocValue) {
        let name = name.into();
        match self.properties.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((name, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<DocValue>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Iterates properties in insertion order
    pub fn properties(&self) -> impl Iterator<Item = (&str, &DocValue)> {
        self.properties.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the document has no properties
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Resolves a dotted property path (`address.city`) to its JSON value.
    ///
    /// Descends into nested documents and into dynamic JSON objects.
    pub fn lookup(&self, path: &str) -> Option<Value> {
        let segments: Vec<&str> = path.split('.').collect();
        let (head, rest) = segments.split_first()?;
        self.get(head)?.lookup(rest)
    }

    /// Exports all properties as an ordered JSON object
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.properties
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect()
    }
}

/// An embedded document descriptor carried in a list-valued property.
///
/// Its `properties` are not re-typed against any schema.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedDocument {
    pub type_name: String,
    pub version: i32,
    pub transient: bool,
    pub properties: Map<String, Value>,
}

impl EmbeddedDocument {
    /// Exports the descriptor in its wire form
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("typeName".into(), Value::String(self.type_name.clone()));
        map.insert("version".into(), Value::from(self.version));
        map.insert("transient".into(), Value::Bool(self.transient));
        map.insert("properties".into(), Value::Object(self.properties.clone()));
        Value::Object(map)
    }
}
