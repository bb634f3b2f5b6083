//! In-process vector service double.
//!
//! Mirrors the service rules this repo depends on: reference targets must
//! exist at creation time, records are validated against their collection,
//! and reference ids must resolve inside the target collection. Reads come
//! back in insertion order.

use std::collections::{BTreeMap, HashSet};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::query::{GetQuery, Selection};
use crate::record::{Record, StoredObject};
use crate::schema::{CollectionDef, FieldDef};
use crate::{ObjectId, VectorStore};

#[derive(Debug, Clone)]
struct StoredRecord {
    id: ObjectId,
    properties: Map<String, Value>,
    references: BTreeMap<String, ObjectId>,
}

#[derive(Debug, Clone)]
struct Collection {
    def: CollectionDef,
    objects: Vec<StoredRecord>,
}

#[derive(Debug, Default)]
struct Inner {
    collections: Vec<Collection>,
    unavailable_for: u32,
}

impl Inner {
    fn check_available(&mut self) -> Result<()> {
        if self.unavailable_for > 0 {
            self.unavailable_for -= 1;
            return Err(StoreError::Transport("connection refused".into()));
        }
        Ok(())
    }

    fn find(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.def.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut Collection> {
        self.collections.iter_mut().find(|c| c.def.name == name)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `calls` operations with a transport error.
    pub fn set_unavailable_for(&self, calls: u32) {
        self.inner.lock().unavailable_for = calls;
    }
}

fn check_definition(def: &CollectionDef) -> Result<()> {
    if def.name.is_empty() || !def.name.starts_with(|c: char| c.is_ascii_uppercase()) {
        return Err(StoreError::invalid(format!(
            "collection name `{}` must start with an uppercase letter",
            def.name
        )));
    }
    let mut seen = HashSet::new();
    for field in &def.fields {
        if !seen.insert(field.name()) {
            return Err(StoreError::invalid(format!(
                "{} declares `{}` twice",
                def.name,
                field.name()
            )));
        }
        if let FieldDef::Object { name, fields } = field {
            if fields.is_empty() {
                return Err(StoreError::invalid(format!(
                    "{}.{name} is an object without sub-fields",
                    def.name
                )));
            }
        }
    }
    Ok(())
}

fn select_subfields(value: Option<&Value>, fields: &[String]) -> Value {
    match value.and_then(Value::as_object) {
        Some(obj) => {
            let mut out = Map::new();
            for f in fields {
                out.insert(f.clone(), obj.get(f).cloned().unwrap_or(Value::Null));
            }
            Value::Object(out)
        }
        None => Value::Null,
    }
}

impl VectorStore for MemoryStore {
    fn list_collections(&self) -> Result<Vec<String>> {
        let mut inner = self.inner.lock();
        inner.check_available()?;
        Ok(inner.collections.iter().map(|c| c.def.name.clone()).collect())
    }

    fn collection_exists(&self, name: &str) -> Result<bool> {
        let mut inner = self.inner.lock();
        inner.check_available()?;
        Ok(inner.find(name).is_some())
    }

    fn collection_schema(&self, name: &str) -> Result<CollectionDef> {
        let mut inner = self.inner.lock();
        inner.check_available()?;
        inner
            .find(name)
            .map(|c| c.def.clone())
            .ok_or_else(|| StoreError::NotFound(format!("collection {name}")))
    }

    fn create_collection(&self, def: &CollectionDef) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.check_available()?;
        check_definition(def)?;
        if inner.find(&def.name).is_some() {
            return Err(StoreError::invalid(format!(
                "collection {} already exists",
                def.name
            )));
        }
        for (field, target) in def.references() {
            if target != def.name && inner.find(target).is_none() {
                return Err(StoreError::invalid(format!(
                    "{}.{field} references missing collection {target}",
                    def.name
                )));
            }
        }
        inner.collections.push(Collection {
            def: def.clone(),
            objects: Vec::new(),
        });
        Ok(())
    }

    fn delete_collection(&self, name: &str) -> Result<bool> {
        let mut inner = self.inner.lock();
        inner.check_available()?;
        let before = inner.collections.len();
        inner.collections.retain(|c| c.def.name != name);
        Ok(inner.collections.len() != before)
    }

    fn insert(&self, collection: &str, record: &Record) -> Result<ObjectId> {
        let mut inner = self.inner.lock();
        inner.check_available()?;
        let def = inner
            .find(collection)
            .map(|c| c.def.clone())
            .ok_or_else(|| StoreError::NotFound(format!("collection {collection}")))?;
        def.validate(record)?;

        for (field, id) in &record.references {
            let Some(FieldDef::Reference { target, .. }) = def.field(field) else {
                continue;
            };
            let resolves = inner
                .find(target)
                .map(|t| t.objects.iter().any(|o| o.id == *id))
                .unwrap_or(false);
            if !resolves {
                return Err(StoreError::invalid(format!(
                    "{collection}.{field}: no {target} object with id {id}"
                )));
            }
        }

        let id = Uuid::new_v4();
        let target = inner
            .find_mut(collection)
            .ok_or_else(|| StoreError::NotFound(format!("collection {collection}")))?;
        target.objects.push(StoredRecord {
            id,
            properties: record.properties.clone(),
            references: record.references.clone(),
        });
        Ok(id)
    }

    fn fetch_objects(&self, collection: &str, limit: usize) -> Result<Vec<StoredObject>> {
        let mut inner = self.inner.lock();
        inner.check_available()?;
        let c = inner
            .find(collection)
            .ok_or_else(|| StoreError::NotFound(format!("collection {collection}")))?;
        Ok(c.objects
            .iter()
            .take(limit)
            .map(|o| StoredObject {
                id: o.id,
                properties: o.properties.clone(),
            })
            .collect())
    }

    fn count(&self, collection: &str) -> Result<u64> {
        let mut inner = self.inner.lock();
        inner.check_available()?;
        inner
            .find(collection)
            .map(|c| c.objects.len() as u64)
            .ok_or_else(|| StoreError::Query(format!("Cannot query field \"{collection}\"")))
    }

    fn get(&self, query: &GetQuery) -> Result<Vec<Value>> {
        let mut inner = self.inner.lock();
        inner.check_available()?;
        let c = inner.find(&query.collection).ok_or_else(|| {
            StoreError::Query(format!("Cannot query field \"{}\"", query.collection))
        })?;

        for sel in &query.selection {
            let declared = c.def.field(sel.name());
            let ok = match (sel, declared) {
                (Selection::Field(_), Some(FieldDef::Scalar(_))) => true,
                (Selection::Nested { .. }, Some(FieldDef::Object { .. })) => true,
                (Selection::Nested { .. }, Some(FieldDef::Scalar(_))) => true,
                (Selection::Reference { target, .. }, Some(FieldDef::Reference { target: t, .. })) => {
                    target == t
                }
                _ => false,
            };
            if !ok {
                return Err(StoreError::Query(format!(
                    "Cannot query field \"{}\" on type \"{}\"",
                    sel.name(),
                    query.collection
                )));
            }
        }

        let mut rows = Vec::new();
        for obj in c.objects.iter().take(query.limit) {
            let mut row = Map::new();
            for sel in &query.selection {
                let value = match sel {
                    Selection::Field(name) => {
                        obj.properties.get(name).cloned().unwrap_or(Value::Null)
                    }
                    Selection::Nested { name, fields } => {
                        select_subfields(obj.properties.get(name), fields)
                    }
                    Selection::Reference {
                        name,
                        target,
                        fields,
                    } => {
                        let linked = obj.references.get(name).and_then(|id| {
                            inner
                                .find(target)
                                .and_then(|t| t.objects.iter().find(|o| o.id == *id))
                        });
                        match linked {
                            Some(linked) => {
                                let mut out = Map::new();
                                for f in fields {
                                    out.insert(
                                        f.clone(),
                                        linked.properties.get(f).cloned().unwrap_or(Value::Null),
                                    );
                                }
                                Value::Array(vec![Value::Object(out)])
                            }
                            None => Value::Null,
                        }
                    }
                };
                row.insert(sel.name().to_string(), value);
            }
            rows.push(Value::Object(row));
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;
    use serde_json::json;

    fn author() -> CollectionDef {
        CollectionDef::new("Author")
            .text("name")
            .object("address", &[("city", DataType::Text)])
    }

    fn book() -> CollectionDef {
        CollectionDef::new("Book")
            .text("title")
            .reference("writtenBy", "Author")
    }

    #[test]
    fn reference_target_must_exist_before_creation() {
        let store = MemoryStore::new();
        let err = store.create_collection(&book()).unwrap_err();
        assert!(err.to_string().contains("missing collection Author"), "{err}");

        store.create_collection(&author()).unwrap();
        store.create_collection(&book()).unwrap();
        assert_eq!(store.list_collections().unwrap(), vec!["Author", "Book"]);
    }

    #[test]
    fn duplicate_create_is_rejected_and_delete_reports_presence() {
        let store = MemoryStore::new();
        store.create_collection(&author()).unwrap();
        assert!(store.create_collection(&author()).is_err());
        assert!(store.delete_collection("Author").unwrap());
        assert!(!store.delete_collection("Author").unwrap());
        assert!(!store.collection_exists("Author").unwrap());
    }

    #[test]
    fn insert_rejects_dangling_reference() {
        let store = MemoryStore::new();
        store.create_collection(&author()).unwrap();
        store.create_collection(&book()).unwrap();

        let dangling = Record::new("orphan")
            .property("title", json!("Orphan"))
            .reference("writtenBy", Uuid::new_v4());
        assert!(store.insert("Book", &dangling).is_err());
        assert_eq!(store.count("Book").unwrap(), 0);
    }

    #[test]
    fn get_resolves_nested_and_reference_selections() {
        let store = MemoryStore::new();
        store.create_collection(&author()).unwrap();
        store.create_collection(&book()).unwrap();

        let a = store
            .insert(
                "Author",
                &Record::new("a")
                    .property("name", json!("Agatha Christie"))
                    .property("address", json!({ "city": "Torquay" })),
            )
            .unwrap();
        store
            .insert(
                "Book",
                &Record::new("b")
                    .property("title", json!("Murder on the Orient Express"))
                    .reference("writtenBy", a),
            )
            .unwrap();

        let authors = store
            .get(&GetQuery::new("Author", 1).select(Selection::nested("address", &["city"])))
            .unwrap();
        assert_eq!(authors[0]["address"]["city"], "Torquay");

        let books = store
            .get(
                &GetQuery::new("Book", 1)
                    .select(Selection::field("title"))
                    .select(Selection::reference("writtenBy", "Author", &["name"])),
            )
            .unwrap();
        assert_eq!(books[0]["writtenBy"][0]["name"], "Agatha Christie");

        let wrong_target =
            GetQuery::new("Book", 1).select(Selection::reference("writtenBy", "Publisher", &["name"]));
        assert!(matches!(store.get(&wrong_target), Err(StoreError::Query(_))));
    }

    #[test]
    fn outage_applies_to_every_call_then_clears() {
        let store = MemoryStore::new();
        store.set_unavailable_for(2);
        assert!(store.collection_exists("Author").is_err());
        assert!(store.list_collections().is_err());
        assert!(store.list_collections().unwrap().is_empty());
    }
}
