//! Collection definitions: flat scalars, one-level nested objects, typed references.
//!
//! A [`CollectionDef`] is declared once in code and then:
//! - rendered to the service's class JSON (`to_service_json`),
//! - parsed back from a schema listing (`from_service_json`),
//! - used to validate records before they are sent (`validate`).

use std::fmt;

use serde_json::{json, Map, Value};

use crate::error::{Result, StoreError};
use crate::record::Record;

/// Vectorizer used when a definition does not name one.
pub const NO_VECTORIZER: &str = "none";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Text,
    Int,
    Number,
    Boolean,
    Date,
    GeoCoordinates,
    /// A scalar type this crate does not model (e.g. `text[]`); kept verbatim.
    Other(String),
}

impl DataType {
    pub fn wire_name(&self) -> &str {
        match self {
            DataType::Text => "text",
            DataType::Int => "int",
            DataType::Number => "number",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
            DataType::GeoCoordinates => "geoCoordinates",
            DataType::Other(name) => name,
        }
    }

    pub fn from_wire(name: &str) -> Self {
        match name {
            "text" | "string" => DataType::Text,
            "int" => DataType::Int,
            "number" => DataType::Number,
            "boolean" => DataType::Boolean,
            "date" => DataType::Date,
            "geoCoordinates" => DataType::GeoCoordinates,
            other => DataType::Other(other.to_string()),
        }
    }

    fn check(&self, path: &str, value: &Value) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        let ok = match self {
            DataType::Text => value.is_string(),
            DataType::Int => value.is_i64() || value.is_u64(),
            DataType::Number => value.is_number(),
            DataType::Boolean => value.is_boolean(),
            DataType::Date => match value.as_str() {
                Some(s) => chrono::DateTime::parse_from_rfc3339(s).is_ok(),
                None => false,
            },
            DataType::GeoCoordinates => is_geo_pair(value),
            DataType::Other(_) => true,
        };
        if ok {
            Ok(())
        } else {
            Err(StoreError::invalid(format!(
                "property `{path}` expects {} but got {value}",
                self.wire_name()
            )))
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

fn is_geo_pair(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    let lat = obj.get("latitude").and_then(Value::as_f64);
    let lon = obj.get("longitude").and_then(Value::as_f64);
    matches!((lat, lon), (Some(lat), Some(lon))
        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon))
}

/// A scalar field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    pub data_type: DataType,
    /// Exclude this field from the service's vectorization pipeline.
    pub skip_vectorization: bool,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            skip_vectorization: false,
        }
    }

    pub fn unvectorized(mut self) -> Self {
        self.skip_vectorization = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDef {
    Scalar(PropertyDef),
    /// Named sub-fields, one level deep; sub-fields are scalars only.
    Object { name: String, fields: Vec<PropertyDef> },
    /// Points at exactly one record of `target`.
    Reference { name: String, target: String },
}

impl FieldDef {
    pub fn name(&self) -> &str {
        match self {
            FieldDef::Scalar(p) => &p.name,
            FieldDef::Object { name, .. } | FieldDef::Reference { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDef {
    pub name: String,
    pub vectorizer: Option<String>,
    pub fields: Vec<FieldDef>,
}

impl CollectionDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vectorizer: None,
            fields: Vec::new(),
        }
    }

    pub fn vectorizer(mut self, vectorizer: impl Into<String>) -> Self {
        self.vectorizer = Some(vectorizer.into());
        self
    }

    pub fn scalar(mut self, property: PropertyDef) -> Self {
        self.fields.push(FieldDef::Scalar(property));
        self
    }

    pub fn text(self, name: &str) -> Self {
        self.scalar(PropertyDef::new(name, DataType::Text))
    }

    pub fn text_unvectorized(self, name: &str) -> Self {
        self.scalar(PropertyDef::new(name, DataType::Text).unvectorized())
    }

    pub fn int(self, name: &str) -> Self {
        self.scalar(PropertyDef::new(name, DataType::Int))
    }

    pub fn number(self, name: &str) -> Self {
        self.scalar(PropertyDef::new(name, DataType::Number))
    }

    pub fn boolean(self, name: &str) -> Self {
        self.scalar(PropertyDef::new(name, DataType::Boolean))
    }

    pub fn date(self, name: &str) -> Self {
        self.scalar(PropertyDef::new(name, DataType::Date))
    }

    pub fn geo(self, name: &str) -> Self {
        self.scalar(PropertyDef::new(name, DataType::GeoCoordinates))
    }

    /// Nested object built from `(sub_field, type)` pairs.
    pub fn object(mut self, name: &str, fields: &[(&str, DataType)]) -> Self {
        self.fields.push(FieldDef::Object {
            name: name.to_string(),
            fields: fields
                .iter()
                .map(|(n, t)| PropertyDef::new(*n, t.clone()))
                .collect(),
        });
        self
    }

    pub fn reference(mut self, name: &str, target: &str) -> Self {
        self.fields.push(FieldDef::Reference {
            name: name.to_string(),
            target: target.to_string(),
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// `(field, target)` for every reference field, in declaration order.
    pub fn references(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().filter_map(|f| match f {
            FieldDef::Reference { name, target } => Some((name.as_str(), target.as_str())),
            _ => None,
        })
    }

    /// Check a record against this definition.
    ///
    /// Properties may be omitted; properties that are present must be declared
    /// and well-typed. Reference ids are not resolved here (that needs the store).
    pub fn validate(&self, record: &Record) -> Result<()> {
        for (key, value) in &record.properties {
            match self.field(key) {
                Some(FieldDef::Scalar(prop)) => prop.data_type.check(key, value)?,
                Some(FieldDef::Object { fields, .. }) => validate_object(key, fields, value)?,
                Some(FieldDef::Reference { .. }) => {
                    return Err(StoreError::invalid(format!(
                        "`{key}` is a reference on {} and must be passed as a reference",
                        self.name
                    )))
                }
                None => {
                    return Err(StoreError::invalid(format!(
                        "{} has no property `{key}`",
                        self.name
                    )))
                }
            }
        }
        for key in record.references.keys() {
            if !matches!(self.field(key), Some(FieldDef::Reference { .. })) {
                return Err(StoreError::invalid(format!(
                    "{} has no reference field `{key}`",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Render as the service's class document.
    pub fn to_service_json(&self) -> Value {
        let vectorizer = self.vectorizer.as_deref().unwrap_or(NO_VECTORIZER);
        let properties: Vec<Value> = self
            .fields
            .iter()
            .map(|field| match field {
                FieldDef::Scalar(prop) => property_json(prop, vectorizer),
                FieldDef::Object { name, fields } => json!({
                    "name": name,
                    "dataType": ["object"],
                    "nestedProperties": fields
                        .iter()
                        .map(|p| property_json(p, vectorizer))
                        .collect::<Vec<_>>(),
                }),
                FieldDef::Reference { name, target } => json!({
                    "name": name,
                    "dataType": [target],
                }),
            })
            .collect();

        json!({
            "class": self.name,
            "vectorizer": vectorizer,
            "properties": properties,
        })
    }

    /// Parse a class document returned by the schema endpoint.
    pub fn from_service_json(value: &Value) -> Result<Self> {
        let name = value
            .get("class")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Decode("class document without `class`".into()))?;
        let vectorizer = value
            .get("vectorizer")
            .and_then(Value::as_str)
            .filter(|v| *v != NO_VECTORIZER)
            .map(str::to_string);

        let mut fields = Vec::new();
        let props = value
            .get("properties")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for prop in props {
            let prop_name = prop
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| StoreError::Decode(format!("{name}: property without name")))?;
            let data_type = first_data_type(prop)
                .ok_or_else(|| StoreError::Decode(format!("{name}.{prop_name}: no dataType")))?;

            if data_type == "object" {
                let nested = prop
                    .get("nestedProperties")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let mut sub = Vec::new();
                for n in nested {
                    let sub_name = n.get("name").and_then(Value::as_str).unwrap_or_default();
                    let sub_type = first_data_type(n).unwrap_or("text");
                    sub.push(PropertyDef {
                        name: sub_name.to_string(),
                        data_type: DataType::from_wire(sub_type),
                        skip_vectorization: is_skipped(n),
                    });
                }
                fields.push(FieldDef::Object {
                    name: prop_name.to_string(),
                    fields: sub,
                });
            } else if data_type.starts_with(|c: char| c.is_ascii_uppercase()) {
                fields.push(FieldDef::Reference {
                    name: prop_name.to_string(),
                    target: data_type.to_string(),
                });
            } else {
                fields.push(FieldDef::Scalar(PropertyDef {
                    name: prop_name.to_string(),
                    data_type: DataType::from_wire(data_type),
                    skip_vectorization: is_skipped(prop),
                }));
            }
        }

        Ok(Self {
            name: name.to_string(),
            vectorizer,
            fields,
        })
    }
}

fn validate_object(path: &str, fields: &[PropertyDef], value: &Value) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }
    let Some(obj) = value.as_object() else {
        return Err(StoreError::invalid(format!(
            "property `{path}` expects object but got {value}"
        )));
    };
    for (key, sub_value) in obj {
        let sub = fields.iter().find(|p| &p.name == key).ok_or_else(|| {
            StoreError::invalid(format!("object `{path}` has no sub-field `{key}`"))
        })?;
        sub.data_type.check(&format!("{path}.{key}"), sub_value)?;
    }
    Ok(())
}

fn property_json(prop: &PropertyDef, vectorizer: &str) -> Value {
    let mut out = Map::new();
    out.insert("name".into(), json!(prop.name));
    out.insert("dataType".into(), json!([prop.data_type.wire_name()]));
    if prop.skip_vectorization && vectorizer != NO_VECTORIZER {
        out.insert(
            "moduleConfig".into(),
            json!({ vectorizer: { "skip": true } }),
        );
    }
    Value::Object(out)
}

fn first_data_type(prop: &Value) -> Option<&str> {
    prop.get("dataType")?.as_array()?.first()?.as_str()
}

fn is_skipped(prop: &Value) -> bool {
    prop.get("moduleConfig")
        .and_then(Value::as_object)
        .map(|modules| {
            modules
                .values()
                .any(|cfg| cfg.get("skip").and_then(Value::as_bool) == Some(true))
        })
        .unwrap_or(false)
}
