//! Type descriptor definitions
//!
//! A type descriptor is built once by the schema builder, registered once,
//! and shared read-only (`Arc<TypeDescriptor>`) afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::primitive::PropertyType;

/// Declares a closed, name-matched enumeration used in schema descriptions.
macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// All members in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the member name
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Looks up a member by exact name
            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|m| m.as_str() == name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

named_enum!(
    /// Index kind applied to id, routing, or compound paths
    IndexType {
        None => "NONE",
        Basic => "BASIC",
        Extended => "EXTENDED",
        Equal => "EQUAL",
        Ordered => "ORDERED",
        EqualAndOrdered => "EQUAL_AND_ORDERED",
    }
);

named_enum!(
    /// Ordering semantics in the storage collaborator; validated, never interpreted here
    FifoSupport {
        NotSet => "NOT_SET",
        Off => "OFF",
        Operation => "OPERATION",
        All => "ALL",
    }
);

named_enum!(
    /// Physical encoding of a document or property
    StorageType {
        Default => "DEFAULT",
        Object => "OBJECT",
        Binary => "BINARY",
        Compressed => "COMPRESSED",
    }
);

named_enum!(
    /// Embedding mode of a fixed property holding documents
    DocumentSupport {
        Default => "DEFAULT",
        Copy => "COPY",
        Convert => "CONVERT",
    }
);

impl Default for FifoSupport {
    fn default() -> Self {
        FifoSupport::NotSet
    }
}

impl Default for StorageType {
    fn default() -> Self {
        StorageType::Default
    }
}

/// Primary key declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdProperty {
    pub property_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_generated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_type: Option<IndexType>,
}

impl IdProperty {
    /// Id on the given property with default generation and index
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            auto_generated: None,
            index_type: None,
        }
    }

    /// Whether the storage collaborator generates missing ids
    pub fn is_auto_generated(&self) -> bool {
        self.auto_generated.unwrap_or(false)
    }
}

/// Partition routing declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingProperty {
    pub property_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_type: Option<IndexType>,
}

/// Index over several property paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundIndex {
    pub paths: Vec<String>,
    /// `None` defers to the storage collaborator's default uniqueness
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
}

/// A declared (fixed) property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedProperty {
    pub property_name: String,
    pub property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_support: Option<DocumentSupport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<StorageType>,
}

impl FixedProperty {
    /// A fixed property with no document support or storage overrides
    pub fn new(property_name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            property_name: property_name.into(),
            property_type,
            document_support: None,
            storage_type: None,
        }
    }
}

/// Complete, immutable schema of a document type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    pub type_name: String,
    pub id_property: IdProperty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_property: Option<RoutingProperty>,
    #[serde(default)]
    pub compound_indexes: Vec<CompoundIndex>,
    #[serde(default)]
    pub fifo_support: FifoSupport,
    #[serde(default)]
    pub blobstore_enabled: bool,
    #[serde(default)]
    pub supports_optimistic_locking: bool,
    #[serde(default = "default_dynamic_properties")]
    pub supports_dynamic_properties: bool,
    #[serde(default)]
    pub storage_type: StorageType,
    #[serde(default)]
    pub fixed_properties: Vec<FixedProperty>,
}

fn default_dynamic_properties() -> bool {
    true
}

impl TypeDescriptor {
    /// Descriptor with only an id property; every other setting at its default
    pub fn new(type_name: impl Into<String>, id_property: IdProperty) -> Self {
        Self {
            type_name: type_name.into(),
            id_property,
            routing_property: None,
            compound_indexes: Vec::new(),
            fifo_support: FifoSupport::default(),
            blobstore_enabled: false,
            supports_optimistic_locking: false,
            supports_dynamic_properties: true,
            storage_type: StorageType::default(),
            fixed_properties: Vec::new(),
        }
    }

    /// Returns the id property name
    pub fn id_property_name(&self) -> &str {
        &self.id_property.property_name
    }

    /// Returns the routing property name, defaulting to the id property
    pub fn routing_property_name(&self) -> &str {
        self.routing_property
            .as_ref()
            .map(|r| r.property_name.as_str())
            .unwrap_or_else(|| self.id_property_name())
    }

    /// Looks up a fixed property by name
    pub fn fixed_property(&self, name: &str) -> Option<&FixedProperty> {
        self.fixed_properties.iter().find(|p| p.property_name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_enum_lookup_is_exact() {
        assert_eq!(IndexType::from_name("EQUAL"), Some(IndexType::Equal));
        assert_eq!(IndexType::from_name("equal"), None);
        assert_eq!(FifoSupport::from_name("OPERATION"), Some(FifoSupport::Operation));
        assert_eq!(StorageType::from_name("BINARY"), Some(StorageType::Binary));
        assert_eq!(DocumentSupport::from_name("COPY"), Some(DocumentSupport::Copy));
    }

    #[test]
    fn test_routing_defaults_to_id() {
        let mut descriptor = TypeDescriptor::new("Product", IdProperty::new("CatalogNumber"));
        assert_eq!(descriptor.routing_property_name(), "CatalogNumber");

        descriptor.routing_property = Some(RoutingProperty {
            property_name: "Category".into(),
            index_type: None,
        });
        assert_eq!(descriptor.routing_property_name(), "Category");
    }

    #[test]
    fn test_defaults() {
        let descriptor = TypeDescriptor::new("Product", IdProperty::new("id"));
        assert!(descriptor.supports_dynamic_properties);
        assert!(!descriptor.blobstore_enabled);
        assert!(!descriptor.supports_optimistic_locking);
        assert_eq!(descriptor.fifo_support, FifoSupport::NotSet);
        assert_eq!(descriptor.storage_type, StorageType::Default);
        assert!(!descriptor.id_property.is_auto_generated());
    }

    #[test]
    fn test_serde_round_trip() {
        let mut descriptor = TypeDescriptor::new("Product", IdProperty::new("id"));
        descriptor.fixed_properties.push(FixedProperty::new(
            "price",
            PropertyType::resolve("double").unwrap(),
        ));
        descriptor.fifo_support = FifoSupport::All;

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["fifoSupport"], "ALL");
        assert_eq!(json["fixedProperties"][0]["propertyType"], "double");

        let back: TypeDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, descriptor);
    }
}
