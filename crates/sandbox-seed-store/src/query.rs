//! Read-side queries and their GraphQL rendering.
//!
//! Only two shapes are needed: `Aggregate { meta { count } }` and a
//! limited `Get` with nested-object and reference selections.

use serde_json::Value;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Field(String),
    /// `name { a b }` on a nested object (or geo pair).
    Nested { name: String, fields: Vec<String> },
    /// `name { ... on Target { a b } }` on a reference field.
    Reference {
        name: String,
        target: String,
        fields: Vec<String>,
    },
}

impl Selection {
    pub fn field(name: &str) -> Self {
        Self::Field(name.to_string())
    }

    pub fn nested(name: &str, fields: &[&str]) -> Self {
        Self::Nested {
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn reference(name: &str, target: &str, fields: &[&str]) -> Self {
        Self::Reference {
            name: name.to_string(),
            target: target.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Selection::Field(name)
            | Selection::Nested { name, .. }
            | Selection::Reference { name, .. } => name,
        }
    }

    fn render(&self, out: &mut String) {
        match self {
            Selection::Field(name) => out.push_str(name),
            Selection::Nested { name, fields } => {
                out.push_str(&format!("{name} {{ {} }}", fields.join(" ")));
            }
            Selection::Reference {
                name,
                target,
                fields,
            } => {
                out.push_str(&format!(
                    "{name} {{ ... on {target} {{ {} }} }}",
                    fields.join(" ")
                ));
            }
        }
    }
}

/// `Get { <collection>(limit: N) { ...selection } }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetQuery {
    pub collection: String,
    pub limit: usize,
    pub selection: Vec<Selection>,
}

impl GetQuery {
    pub fn new(collection: &str, limit: usize) -> Self {
        Self {
            collection: collection.to_string(),
            limit,
            selection: Vec::new(),
        }
    }

    pub fn select(mut self, selection: Selection) -> Self {
        self.selection.push(selection);
        self
    }

    pub fn to_graphql(&self) -> String {
        let mut body = String::new();
        for (i, sel) in self.selection.iter().enumerate() {
            if i > 0 {
                body.push(' ');
            }
            sel.render(&mut body);
        }
        format!(
            "{{ Get {{ {}(limit: {}) {{ {body} }} }} }}",
            self.collection, self.limit
        )
    }

    /// Pull `data.Get.<collection>` out of a GraphQL response.
    pub fn parse_rows(&self, response: &Value) -> Result<Vec<Value>> {
        check_graphql_errors(response)?;
        let rows = response
            .pointer(&format!("/data/Get/{}", self.collection))
            .ok_or_else(|| {
                StoreError::Decode(format!("no data.Get.{} in response", self.collection))
            })?;
        match rows {
            Value::Array(rows) => Ok(rows.clone()),
            Value::Null => Ok(Vec::new()),
            other => Err(StoreError::Decode(format!(
                "data.Get.{} is not a list: {other}",
                self.collection
            ))),
        }
    }
}

pub fn count_query(collection: &str) -> String {
    format!("{{ Aggregate {{ {collection} {{ meta {{ count }} }} }} }}")
}

/// Pull the count out of an `Aggregate` response; an empty group list means zero.
pub fn parse_count(collection: &str, response: &Value) -> Result<u64> {
    check_graphql_errors(response)?;
    let groups = response
        .pointer(&format!("/data/Aggregate/{collection}"))
        .ok_or_else(|| StoreError::Decode(format!("no data.Aggregate.{collection} in response")))?;
    let Some(first) = groups.as_array().and_then(|g| g.first()) else {
        return Ok(0);
    };
    first
        .pointer("/meta/count")
        .and_then(Value::as_u64)
        .ok_or_else(|| StoreError::Decode(format!("no meta.count for {collection}")))
}

fn check_graphql_errors(response: &Value) -> Result<()> {
    let Some(errors) = response.get("errors").and_then(Value::as_array) else {
        return Ok(());
    };
    if errors.is_empty() {
        return Ok(());
    }
    let messages: Vec<String> = errors
        .iter()
        .map(|e| {
            e.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string())
        })
        .collect();
    Err(StoreError::Query(messages.join("; ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_query_renders_nested_and_reference_selections() {
        let q = GetQuery::new("Book", 1)
            .select(Selection::field("title"))
            .select(Selection::nested("metadata", &["language", "format"]))
            .select(Selection::reference("writtenBy", "Author", &["name"]));
        assert_eq!(
            q.to_graphql(),
            "{ Get { Book(limit: 1) { title metadata { language format } \
             writtenBy { ... on Author { name } } } } }"
        );
    }

    #[test]
    fn count_parsing_handles_empty_groups_and_errors() {
        let ok = json!({ "data": { "Aggregate": { "Author": [{ "meta": { "count": 3 } }] } } });
        assert_eq!(parse_count("Author", &ok).unwrap(), 3);

        let empty = json!({ "data": { "Aggregate": { "Author": [] } } });
        assert_eq!(parse_count("Author", &empty).unwrap(), 0);

        let err = json!({ "errors": [{ "message": "Cannot query field \"Nope\"" }] });
        assert!(matches!(parse_count("Nope", &err), Err(StoreError::Query(_))));

        let missing = json!({ "data": {} });
        assert!(matches!(parse_count("Author", &missing), Err(StoreError::Decode(_))));
    }

    #[test]
    fn rows_parsing_tolerates_null_result() {
        let q = GetQuery::new("Author", 1).select(Selection::field("name"));
        let null = json!({ "data": { "Get": { "Author": null } } });
        assert!(q.parse_rows(&null).unwrap().is_empty());

        let rows = json!({ "data": { "Get": { "Author": [{ "name": "Agatha Christie" }] } } });
        assert_eq!(q.parse_rows(&rows).unwrap()[0]["name"], "Agatha Christie");
    }
}
