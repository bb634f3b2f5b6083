//! Positional cross-reference linking: the i-th dependent links to the i-th parent.

use colored::Colorize;
use sandbox_seed_store::{ObjectId, Record, VectorStore};

use crate::batch::BatchReport;

/// What to do when a dependent has no parent at its own index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkPolicy {
    /// Link to the first parent instead.
    #[default]
    FallbackToFirst,
    /// Refuse to link; the dependent record is counted as failed.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("no {field} parents were inserted")]
    NoParents { field: String },
    #[error("{field}: no parent at position {index} (only {available} inserted)")]
    OutOfRange {
        field: String,
        index: usize,
        available: usize,
    },
}

pub fn link_positional(
    field: &str,
    parents: &[ObjectId],
    index: usize,
    policy: LinkPolicy,
) -> Result<ObjectId, LinkError> {
    if let Some(id) = parents.get(index) {
        return Ok(*id);
    }
    match (policy, parents.first()) {
        (_, None) => Err(LinkError::NoParents {
            field: field.to_string(),
        }),
        (LinkPolicy::FallbackToFirst, Some(first)) => {
            tracing::debug!(field, index, "linking to first parent");
            Ok(*first)
        }
        (LinkPolicy::Strict, Some(_)) => Err(LinkError::OutOfRange {
            field: field.to_string(),
            index,
            available: parents.len(),
        }),
    }
}

/// Insert dependent records, attaching for each reference field the parent
/// chosen by position. A record whose links cannot be resolved is counted as
/// a failure and the batch moves on.
pub fn insert_linked_batch<S>(
    store: &S,
    collection: &str,
    records: &[Record],
    parents: &[(&str, &[ObjectId])],
    policy: LinkPolicy,
) -> BatchReport
where
    S: VectorStore + ?Sized,
{
    let mut report = BatchReport::new(collection);
    for (i, record) in records.iter().enumerate() {
        let linked = parents.iter().try_fold(record.clone(), |rec, (field, ids)| {
            link_positional(field, ids, i, policy).map(|id| rec.reference(field, id))
        });
        let linked = match linked {
            Ok(linked) => linked,
            Err(err) => {
                println!("{} Failed to insert {}: {err}", "✗".red(), record.label);
                report.record_failure(&record.label, err);
                continue;
            }
        };
        if report.insert(store, &linked).is_some() {
            println!("{} Inserted {}", "✓".green(), record.label);
        } else if let Some(failure) = report.failures.last() {
            println!(
                "{} Failed to insert {}: {}",
                "✗".red(),
                failure.label,
                failure.reason
            );
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox_seed_store::{CollectionDef, MemoryStore};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn third_dependent_of_two_parents_links_to_the_first() {
        let parents = [Uuid::new_v4(), Uuid::new_v4()];
        let links: Vec<_> = (0..3)
            .map(|i| link_positional("writtenBy", &parents, i, LinkPolicy::FallbackToFirst).unwrap())
            .collect();
        assert_eq!(links, vec![parents[0], parents[1], parents[0]]);
    }

    #[test]
    fn strict_policy_reports_out_of_range() {
        let parents = [Uuid::new_v4(), Uuid::new_v4()];
        assert_eq!(
            link_positional("writtenBy", &parents, 2, LinkPolicy::Strict),
            Err(LinkError::OutOfRange {
                field: "writtenBy".into(),
                index: 2,
                available: 2
            })
        );
        assert_eq!(
            link_positional("writtenBy", &parents, 1, LinkPolicy::Strict),
            Ok(parents[1])
        );
    }

    #[test]
    fn no_parents_is_an_error_under_both_policies() {
        for policy in [LinkPolicy::FallbackToFirst, LinkPolicy::Strict] {
            assert!(matches!(
                link_positional("reviewsBook", &[], 0, policy),
                Err(LinkError::NoParents { .. })
            ));
        }
    }

    fn parent_and_child(store: &MemoryStore) -> Vec<ObjectId> {
        store
            .create_collection(&CollectionDef::new("Parent").text("name"))
            .unwrap();
        store
            .create_collection(
                &CollectionDef::new("Child")
                    .text("name")
                    .reference("parent", "Parent"),
            )
            .unwrap();
        ["p0", "p1"]
            .iter()
            .map(|n| {
                store
                    .insert("Parent", &Record::new(*n).property("name", json!(n)))
                    .unwrap()
            })
            .collect()
    }

    fn children(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new(format!("c{i}")).property("name", json!(format!("c{i}"))))
            .collect()
    }

    #[test]
    fn linked_batch_falls_back_for_short_parent_lists() {
        let store = MemoryStore::new();
        let parents = parent_and_child(&store);
        let report = insert_linked_batch(
            &store,
            "Child",
            &children(3),
            &[("parent", &parents)],
            LinkPolicy::FallbackToFirst,
        );
        assert_eq!(report.succeeded(), 3);

        let rows = store
            .get(
                &sandbox_seed_store::GetQuery::new("Child", 3)
                    .select(sandbox_seed_store::Selection::reference("parent", "Parent", &["name"])),
            )
            .unwrap();
        let linked: Vec<_> = rows
            .iter()
            .map(|r| r["parent"][0]["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(linked, vec!["p0", "p1", "p0"]);
    }

    #[test]
    fn strict_linked_batch_fails_only_the_unlinkable_record() {
        let store = MemoryStore::new();
        let parents = parent_and_child(&store);
        let report = insert_linked_batch(
            &store,
            "Child",
            &children(3),
            &[("parent", &parents)],
            LinkPolicy::Strict,
        );
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failures[0].label, "c2");
        assert_eq!(store.count("Child").unwrap(), 2);
    }
}
