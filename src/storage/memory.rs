//! In-memory document store
//!
//! Documents are kept per type in insertion order and keyed by their id
//! property. Writes are upserts: an existing id keeps its position.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde_json::Value;
use uuid::Uuid;

use crate::document::{DocValue, TypedDocument};
use crate::errors::{StoreError, StoreResult};
use crate::schema::{PrimitiveValue, TypeDescriptor};

use super::query::Predicate;
use super::DocumentStore;

/// Documents of one type
#[derive(Debug, Default)]
struct Collection {
    next_seq: u64,
    /// Documents by insertion sequence
    entries: BTreeMap<u64, TypedDocument>,
    /// Id key -> sequence
    ids: HashMap<String, u64>,
}

impl Collection {
    fn upsert(&mut self, key: String, doc: TypedDocument) {
        match self.ids.get(&key) {
            Some(seq) => {
                self.entries.insert(*seq, doc);
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.ids.insert(key, seq);
                self.entries.insert(seq, doc);
            }
        }
    }

    fn get(&self, key: &str) -> Option<&TypedDocument> {
        self.ids.get(key).and_then(|seq| self.entries.get(seq))
    }

    fn remove(&mut self, key: &str) -> Option<TypedDocument> {
        let seq = self.ids.remove(key)?;
        self.entries.remove(&seq)
    }

    fn matching(&self, predicate: &Predicate, max: Option<usize>) -> Vec<(u64, &TypedDocument)> {
        self.entries
            .iter()
            .filter(|(_, doc)| predicate.matches(doc))
            .take(max.unwrap_or(usize::MAX))
            .map(|(seq, doc)| (*seq, doc))
            .collect()
    }
}

/// Reference storage collaborator holding everything in memory
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_collection<R>(&self, type_name: &str, f: impl FnOnce(&Collection) -> R) -> StoreResult<R> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        let empty = Collection::default();
        Ok(f(collections.get(type_name).unwrap_or(&empty)))
    }

    fn with_collection_mut<R>(
        &self,
        type_name: &str,
        f: impl FnOnce(&mut Collection) -> R,
    ) -> StoreResult<R> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        Ok(f(collections.entry(type_name.to_string()).or_default()))
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn read_by_id(
        &self,
        descriptor: &TypeDescriptor,
        id: &PrimitiveValue,
    ) -> StoreResult<Option<TypedDocument>> {
        let key = id_key(&id.to_json());
        self.with_collection(&descriptor.type_name, |c| c.get(&key).cloned())
    }

    fn read_multiple(
        &self,
        descriptor: &TypeDescriptor,
        query: &str,
        max: Option<usize>,
    ) -> StoreResult<Vec<TypedDocument>> {
        let predicate = Predicate::parse(query)?;
        self.with_collection(&descriptor.type_name, |c| {
            c.matching(&predicate, max)
                .into_iter()
                .map(|(_, doc)| doc.clone())
                .collect()
        })
    }

    fn take_by_id(
        &self,
        descriptor: &TypeDescriptor,
        id: &PrimitiveValue,
    ) -> StoreResult<Option<TypedDocument>> {
        let key = id_key(&id.to_json());
        self.with_collection_mut(&descriptor.type_name, |c| c.remove(&key))
    }

    fn take_multiple(
        &self,
        descriptor: &TypeDescriptor,
        query: &str,
        max: Option<usize>,
    ) -> StoreResult<Vec<TypedDocument>> {
        let predicate = Predicate::parse(query)?;
        let id_property = descriptor.id_property_name();
        self.with_collection_mut(&descriptor.type_name, |c| {
            let taken: Vec<u64> = c
                .matching(&predicate, max)
                .into_iter()
                .map(|(seq, _)| seq)
                .collect();
            taken
                .into_iter()
                .filter_map(|seq| {
                    let doc = c.entries.remove(&seq)?;
                    if let Some(value) = doc.get(id_property) {
                        c.ids.remove(&id_key(&value.to_json()));
                    }
                    Some(doc)
                })
                .collect()
        })
    }

    fn write_multiple(
        &self,
        descriptor: &TypeDescriptor,
        documents: Vec<TypedDocument>,
    ) -> StoreResult<()> {
        let id_property = descriptor.id_property_name();

        // Resolve every id before touching the collection so a bad element
        // leaves the store unchanged.
        let mut keyed = Vec::with_capacity(documents.len());
        for mut doc in documents {
            let id = doc.get(id_property).map(DocValue::to_json).unwrap_or(Value::Null);
            let key = if !id.is_null() {
                id_key(&id)
            } else if descriptor.id_property.is_auto_generated() {
                let generated = Uuid::new_v4().to_string();
                doc.insert(id_property, PrimitiveValue::Text(generated.clone()).into());
                generated
            } else {
                return Err(StoreError::collaborator(
                    "MissingIdProperty",
                    format!(
                        "Document of type {} has no value for id property '{}'",
                        descriptor.type_name, id_property
                    ),
                ));
            };
            keyed.push((key, doc));
        }

        let written = keyed.len();
        self.with_collection_mut(&descriptor.type_name, |c| {
            for (key, doc) in keyed {
                c.upsert(key, doc);
            }
        })?;
        tracing::debug!(type_name = %descriptor.type_name, written, "documents written");
        Ok(())
    }

    fn count(&self, descriptor: &TypeDescriptor) -> StoreResult<usize> {
        self.with_collection(&descriptor.type_name, |c| c.entries.len())
    }
}

/// Canonical lookup key for an id value; text ids are used as-is
fn id_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn poisoned() -> StoreError {
    StoreError::collaborator("StorePoisoned", "Document store lock poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::schema::IdProperty;

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new("Product", IdProperty::new("id"))
    }

    fn product(id: &str, price: i64) -> TypedDocument {
        TypedDocument::new("Product")
            .with("id", PrimitiveValue::Text(id.into()))
            .with("price", PrimitiveValue::Long(price))
    }

    fn text(s: &str) -> PrimitiveValue {
        PrimitiveValue::Text(s.into())
    }

    #[test]
    fn test_write_and_read_by_id() {
        let store = InMemoryDocumentStore::new();
        store.write_multiple(&descriptor(), vec![product("a", 1)]).unwrap();

        assert_eq!(store.read_by_id(&descriptor(), &text("a")).unwrap(), Some(product("a", 1)));
        assert_eq!(store.read_by_id(&descriptor(), &text("b")).unwrap(), None);
    }

    #[test]
    fn test_upsert_keeps_position() {
        let store = InMemoryDocumentStore::new();
        store
            .write_multiple(&descriptor(), vec![product("a", 1), product("b", 2)])
            .unwrap();
        store.write_multiple(&descriptor(), vec![product("a", 5)]).unwrap();

        let all = store.read_multiple(&descriptor(), "", None).unwrap();
        assert_eq!(all, vec![product("a", 5), product("b", 2)]);
        assert_eq!(store.count(&descriptor()).unwrap(), 2);
    }

    #[test]
    fn test_query_with_max() {
        let store = InMemoryDocumentStore::new();
        store
            .write_multiple(&descriptor(), vec![product("a", 1), product("b", 2), product("c", 3)])
            .unwrap();

        let found = store.read_multiple(&descriptor(), "price >= 2", Some(1)).unwrap();
        assert_eq!(found, vec![product("b", 2)]);
    }

    #[test]
    fn test_take_removes() {
        let store = InMemoryDocumentStore::new();
        store
            .write_multiple(&descriptor(), vec![product("a", 1), product("b", 2), product("c", 3)])
            .unwrap();

        assert_eq!(store.take_by_id(&descriptor(), &text("a")).unwrap(), Some(product("a", 1)));
        let taken = store.take_multiple(&descriptor(), "price > 2", None).unwrap();
        assert_eq!(taken, vec![product("c", 3)]);
        assert_eq!(store.count(&descriptor()).unwrap(), 1);
        assert_eq!(store.read_by_id(&descriptor(), &text("c")).unwrap(), None);
    }

    #[test]
    fn test_missing_id_rejects_whole_batch() {
        let store = InMemoryDocumentStore::new();
        let no_id = TypedDocument::new("Product").with("price", PrimitiveValue::Long(1));
        let err = store
            .write_multiple(&descriptor(), vec![product("a", 1), no_id])
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Collaborator);
        assert_eq!(err.class(), Some("MissingIdProperty"));
        assert_eq!(store.count(&descriptor()).unwrap(), 0);
    }

    #[test]
    fn test_auto_generated_id() {
        let mut id = IdProperty::new("id");
        id.auto_generated = Some(true);
        let descriptor = TypeDescriptor::new("Product", id);

        let store = InMemoryDocumentStore::new();
        let doc = TypedDocument::new("Product").with("price", PrimitiveValue::Long(1));
        store.write_multiple(&descriptor, vec![doc]).unwrap();

        let stored = store.read_multiple(&descriptor, "", None).unwrap();
        assert!(matches!(stored[0].get("id"), Some(DocValue::Primitive(PrimitiveValue::Text(_)))));
    }

    #[test]
    fn test_numeric_and_text_ids_share_keys() {
        let store = InMemoryDocumentStore::new();
        let doc = TypedDocument::new("Product").with("id", DocValue::Dynamic(serde_json::json!(7)));
        store.write_multiple(&descriptor(), vec![doc]).unwrap();
        assert!(store.read_by_id(&descriptor(), &text("7")).unwrap().is_some());
    }

    #[test]
    fn test_invalid_query() {
        let store = InMemoryDocumentStore::new();
        let err = store.read_multiple(&descriptor(), "price ==", None).unwrap_err();
        assert_eq!(err.class(), Some("InvalidQuery"));
    }
}
