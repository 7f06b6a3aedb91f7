//! Document Marshalling Tests
//!
//! - Nested objects become nested typed documents of the declared type
//! - Export of a marshalled document reproduces the input
//! - Unresolved nested types abandon the whole batch

use docspace::document::{DocValue, Marshaller, TypedDocument};
use docspace::registry::{InMemoryTypeRegistry, TypeRegistry};
use docspace::schema::{build_type, PrimitiveValue};
use docspace::ErrorKind;
use serde_json::{json, Map, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn registry() -> InMemoryTypeRegistry {
    let registry = InMemoryTypeRegistry::new();
    registry
        .register_type(
            build_type(
                "Product",
                &json!({
                    "idProperty": {"propertyName": "CatalogNumber"},
                    "fixedProperties": [
                        {"propertyName": "CatalogNumber", "propertyType": "string"},
                        {"propertyName": "Price", "propertyType": "double"},
                        {"propertyName": "Stock", "propertyType": "long"},
                        {"propertyName": "OnSale", "propertyType": "boolean"},
                        {"propertyName": "nested", "propertyType": "NestedType"},
                        {"propertyName": "orphan", "propertyType": "MissingType"}
                    ]
                }),
            )
            .unwrap(),
        )
        .unwrap();
    registry
        .register_type(build_type("NestedType", &json!({"idProperty": {"propertyName": "id"}})).unwrap())
        .unwrap();
    registry
}

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

// =============================================================================
// Nested Document Tests
// =============================================================================

#[test]
fn test_nested_object_becomes_typed_document() {
    let registry = registry();
    let raw = object(json!({
        "CatalogNumber": "doc1",
        "Category": "Hardware",
        "Name": "Anvil1",
        "nested": {"nestedVar1": "nestedValue1"}
    }));

    let doc = Marshaller::new(&registry)
        .to_typed_document("Product", &raw)
        .unwrap();

    assert_eq!(doc.type_name(), "Product");
    let expected_nested =
        TypedDocument::new("NestedType").with("nestedVar1", DocValue::Dynamic(json!("nestedValue1")));
    assert_eq!(doc.get("nested"), Some(&DocValue::Document(expected_nested)));
    assert_eq!(
        doc.get("CatalogNumber"),
        Some(&DocValue::Primitive(PrimitiveValue::Text("doc1".into())))
    );
    assert_eq!(doc.get("Category"), Some(&DocValue::Dynamic(json!("Hardware"))));
}

#[test]
fn test_key_order_is_preserved() {
    let registry = registry();
    let raw = object(json!({"Name": "a", "CatalogNumber": "1", "Stock": 2, "Category": "c"}));
    let doc = Marshaller::new(&registry).to_typed_document("Product", &raw).unwrap();

    let keys: Vec<&str> = doc.properties().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["Name", "CatalogNumber", "Stock", "Category"]);
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_marshal_then_export_round_trips() {
    let registry = registry();
    let marshaller = Marshaller::new(&registry);
    let inputs = vec![
        json!({
            "CatalogNumber": "doc1",
            "Price": 12.5,
            "Stock": 40,
            "OnSale": true,
            "nested": {"nestedVar1": "nestedValue1", "count": 3},
            "tags": ["a", "b"],
            "extra": null
        }),
        json!({"CatalogNumber": "doc2"}),
        json!({}),
    ];

    for input in inputs {
        let raw = object(input.clone());
        let doc = marshaller.to_typed_document("Product", &raw).unwrap();
        assert_eq!(Value::Object(Marshaller::to_raw_properties(&doc)), input);
    }
}

#[test]
fn test_string_scalars_are_coerced() {
    let registry = registry();
    let raw = object(json!({"Price": "9.5", "Stock": "7", "OnSale": "FALSE"}));
    let doc = Marshaller::new(&registry).to_typed_document("Product", &raw).unwrap();

    assert_eq!(
        Value::Object(Marshaller::to_raw_properties(&doc)),
        json!({"Price": 9.5, "Stock": 7, "OnSale": false})
    );
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_coercion_failure_names_property() {
    let registry = registry();
    let err = Marshaller::new(&registry)
        .to_typed_document("Product", &object(json!({"Stock": "abc"})))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CoercionFailure);
    assert!(err.message().contains("Stock"));
}

#[test]
fn test_scalar_for_nested_type_is_unsupported() {
    let registry = registry();
    let err = Marshaller::new(&registry)
        .to_typed_document("Product", &object(json!({"nested": "flat"})))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedPrimitiveType);
}

#[test]
fn test_unresolved_nested_type_abandons_batch() {
    let registry = registry();
    let payload = json!([
        {"CatalogNumber": "ok"},
        {"CatalogNumber": "bad", "orphan": {"x": 1}}
    ]);

    let err = Marshaller::new(&registry)
        .to_typed_documents("Product", &payload)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeNotFound);
    assert_eq!(err.type_name(), Some("MissingType"));
}

#[test]
fn test_single_object_is_one_element_batch() {
    let registry = registry();
    let docs = Marshaller::new(&registry)
        .to_typed_documents("Product", &json!({"CatalogNumber": "one"}))
        .unwrap();
    assert_eq!(docs.len(), 1);

    let docs = Marshaller::new(&registry)
        .to_typed_documents("Product", &json!([]))
        .unwrap();
    assert!(docs.is_empty());
}
