use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ObjectId;

/// One record to insert: scalar/nested properties plus reference ids.
///
/// `label` is only used for progress and failure messages; it is never sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub label: String,
    pub properties: Map<String, Value>,
    pub references: BTreeMap<String, ObjectId>,
}

impl Record {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            properties: Map::new(),
            references: BTreeMap::new(),
        }
    }

    /// Build from a JSON object literal; non-object values yield no properties.
    pub fn from_json(label: impl Into<String>, value: Value) -> Self {
        let properties = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            label: label.into(),
            properties,
            references: BTreeMap::new(),
        }
    }

    pub fn property(mut self, name: &str, value: Value) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    pub fn reference(mut self, name: &str, id: ObjectId) -> Self {
        self.references.insert(name.to_string(), id);
        self
    }
}

/// A row returned by the simple fetch surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub id: ObjectId,
    #[serde(default)]
    pub properties: Map<String, Value>,
}
