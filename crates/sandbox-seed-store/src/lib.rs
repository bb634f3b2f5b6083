//! Handle to the external vector service.
//!
//! Every component that talks to the service receives a [`VectorStore`]
//! explicitly; nothing here is a global. Two implementations exist:
//!
//! - [`HttpStore`]: the live service over REST (`/v1/schema`, `/v1/objects`)
//!   and GraphQL (`/v1/graphql`), bearer-token authorized.
//! - [`MemoryStore`]: an in-process double with the same reference and
//!   validation rules, used by tests and `--in-memory` runs.
//!
//! Readiness polling lives in [`ready`] and takes an explicit
//! [`RetryPolicy`] plus a [`Sleeper`], so tests never sleep.

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod query;
pub mod ready;
pub mod record;
pub mod schema;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use query::{count_query, GetQuery, Selection};
pub use ready::{wait_until_ready, RetryPolicy, Sleeper, ThreadSleeper};
pub use record::{Record, StoredObject};
pub use schema::{CollectionDef, DataType, FieldDef, PropertyDef};

use serde_json::Value;

/// Identifier assigned by the service on insert.
pub type ObjectId = uuid::Uuid;

/// Collection management, record insert and the read surfaces.
pub trait VectorStore {
    fn list_collections(&self) -> Result<Vec<String>>;

    fn collection_exists(&self, name: &str) -> Result<bool>;

    fn collection_schema(&self, name: &str) -> Result<CollectionDef>;

    fn create_collection(&self, def: &CollectionDef) -> Result<()>;

    /// Returns `false` when there was nothing to delete.
    fn delete_collection(&self, name: &str) -> Result<bool>;

    fn insert(&self, collection: &str, record: &Record) -> Result<ObjectId>;

    fn fetch_objects(&self, collection: &str, limit: usize) -> Result<Vec<StoredObject>>;

    fn count(&self, collection: &str) -> Result<u64>;

    fn get(&self, query: &GetQuery) -> Result<Vec<Value>>;
}

impl<T: VectorStore + ?Sized> VectorStore for &T {
    fn list_collections(&self) -> Result<Vec<String>> {
        (**self).list_collections()
    }

    fn collection_exists(&self, name: &str) -> Result<bool> {
        (**self).collection_exists(name)
    }

    fn collection_schema(&self, name: &str) -> Result<CollectionDef> {
        (**self).collection_schema(name)
    }

    fn create_collection(&self, def: &CollectionDef) -> Result<()> {
        (**self).create_collection(def)
    }

    fn delete_collection(&self, name: &str) -> Result<bool> {
        (**self).delete_collection(name)
    }

    fn insert(&self, collection: &str, record: &Record) -> Result<ObjectId> {
        (**self).insert(collection, record)
    }

    fn fetch_objects(&self, collection: &str, limit: usize) -> Result<Vec<StoredObject>> {
        (**self).fetch_objects(collection, limit)
    }

    fn count(&self, collection: &str) -> Result<u64> {
        (**self).count(collection)
    }

    fn get(&self, query: &GetQuery) -> Result<Vec<Value>> {
        (**self).get(query)
    }
}

impl<T: VectorStore + ?Sized> VectorStore for Box<T> {
    fn list_collections(&self) -> Result<Vec<String>> {
        (**self).list_collections()
    }

    fn collection_exists(&self, name: &str) -> Result<bool> {
        (**self).collection_exists(name)
    }

    fn collection_schema(&self, name: &str) -> Result<CollectionDef> {
        (**self).collection_schema(name)
    }

    fn create_collection(&self, def: &CollectionDef) -> Result<()> {
        (**self).create_collection(def)
    }

    fn delete_collection(&self, name: &str) -> Result<bool> {
        (**self).delete_collection(name)
    }

    fn insert(&self, collection: &str, record: &Record) -> Result<ObjectId> {
        (**self).insert(collection, record)
    }

    fn fetch_objects(&self, collection: &str, limit: usize) -> Result<Vec<StoredObject>> {
        (**self).fetch_objects(collection, limit)
    }

    fn count(&self, collection: &str) -> Result<u64> {
        (**self).count(collection)
    }

    fn get(&self, query: &GetQuery) -> Result<Vec<Value>> {
        (**self).get(query)
    }
}
