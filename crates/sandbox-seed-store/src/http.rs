//! Live vector service over REST + GraphQL.

use std::collections::HashMap;

use parking_lot::Mutex;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::query::{count_query, parse_count, GetQuery};
use crate::record::{Record, StoredObject};
use crate::schema::{CollectionDef, FieldDef};
use crate::{ObjectId, VectorStore};

/// Beacon host segment used in cross-reference payloads.
const BEACON_HOST: &str = "localhost";

pub struct HttpStore {
    client: Client,
    base: Url,
    config: StoreConfig,
    definitions: Mutex<HashMap<String, CollectionDef>>,
}

#[derive(Deserialize)]
struct SchemaListing {
    #[serde(default)]
    classes: Vec<Value>,
}

#[derive(Deserialize)]
struct ObjectListing {
    #[serde(default)]
    objects: Vec<StoredObject>,
}

#[derive(Deserialize)]
struct CreatedObject {
    id: ObjectId,
}

impl HttpStore {
    /// Build the session. No request is sent; use the readiness probe for that.
    pub fn connect(config: StoreConfig) -> Result<Self> {
        let base = config.base_url()?;

        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| StoreError::Config("api key is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(config.init_timeout)
            .timeout(config.query_timeout)
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build http client: {e}")))?;

        tracing::debug!(base = %base, "vector service session opened");
        Ok(Self {
            client,
            base,
            config,
            definitions: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| StoreError::Config(format!("bad path {path}: {e}")))
    }

    fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        tracing::debug!(request = what, "vector service request");
        let resp = request.send()?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        tracing::debug!(request = what, status = status.as_u16(), "vector service error");
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Raw query-language call; the caller interprets `data`/`errors`.
    pub fn graphql(&self, document: &str) -> Result<Value> {
        let url = self.url("v1/graphql")?;
        let resp = self.send(
            self.client
                .post(url)
                .timeout(self.config.query_timeout)
                .json(&json!({ "query": document })),
            "graphql",
        )?;
        Ok(resp.json()?)
    }

    fn definition(&self, name: &str) -> Result<CollectionDef> {
        if let Some(def) = self.definitions.lock().get(name) {
            return Ok(def.clone());
        }
        let def = self.collection_schema(name)?;
        self.definitions
            .lock()
            .insert(name.to_string(), def.clone());
        Ok(def)
    }

    fn insert_payload(&self, def: &CollectionDef, record: &Record) -> Result<Value> {
        let mut properties = record.properties.clone();
        for (field, id) in &record.references {
            let Some(FieldDef::Reference { target, .. }) = def.field(field) else {
                return Err(StoreError::invalid(format!(
                    "{} has no reference field `{field}`",
                    def.name
                )));
            };
            properties.insert(field.clone(), json!([{ "beacon": beacon(target, id) }]));
        }
        Ok(json!({
            "class": def.name,
            "properties": properties,
        }))
    }
}

impl Drop for HttpStore {
    fn drop(&mut self) {
        tracing::debug!(base = %self.base, "vector service session closed");
    }
}

pub fn beacon(target: &str, id: &ObjectId) -> String {
    format!("weaviate://{BEACON_HOST}/{target}/{id}")
}

impl VectorStore for HttpStore {
    fn list_collections(&self) -> Result<Vec<String>> {
        let url = self.url("v1/schema")?;
        let listing: SchemaListing = self.send(self.client.get(url), "list schema")?.json()?;
        Ok(listing
            .classes
            .iter()
            .filter_map(|c| c.get("class").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    fn collection_exists(&self, name: &str) -> Result<bool> {
        match self.collection_schema(name) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn collection_schema(&self, name: &str) -> Result<CollectionDef> {
        let url = self.url(&format!("v1/schema/{name}"))?;
        let doc: Value = self
            .send(self.client.get(url), "get schema")?
            .json()?;
        CollectionDef::from_service_json(&doc)
    }

    fn create_collection(&self, def: &CollectionDef) -> Result<()> {
        let url = self.url("v1/schema")?;
        self.send(
            self.client.post(url).json(&def.to_service_json()),
            "create collection",
        )?;
        self.definitions
            .lock()
            .insert(def.name.clone(), def.clone());
        Ok(())
    }

    fn delete_collection(&self, name: &str) -> Result<bool> {
        self.definitions.lock().remove(name);
        if !self.collection_exists(name)? {
            return Ok(false);
        }
        let url = self.url(&format!("v1/schema/{name}"))?;
        match self.send(self.client.delete(url), "delete collection") {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn insert(&self, collection: &str, record: &Record) -> Result<ObjectId> {
        let def = self.definition(collection)?;
        def.validate(record)?;
        let payload = self.insert_payload(&def, record)?;

        let url = self.url("v1/objects")?;
        let created: CreatedObject = self
            .send(
                self.client
                    .post(url)
                    .timeout(self.config.insert_timeout)
                    .json(&payload),
                "insert object",
            )?
            .json()?;
        Ok(created.id)
    }

    fn fetch_objects(&self, collection: &str, limit: usize) -> Result<Vec<StoredObject>> {
        let mut url = self.url("v1/objects")?;
        url.query_pairs_mut()
            .append_pair("class", collection)
            .append_pair("limit", &limit.to_string());
        let listing: ObjectListing = self.send(self.client.get(url), "fetch objects")?.json()?;
        Ok(listing.objects)
    }

    fn count(&self, collection: &str) -> Result<u64> {
        let response = self.graphql(&count_query(collection))?;
        parse_count(collection, &response)
    }

    fn get(&self, query: &GetQuery) -> Result<Vec<Value>> {
        let response = self.graphql(&query.to_graphql())?;
        query.parse_rows(&response)
    }
}
