//! Idempotent collection setup: drop-if-exists, then create, in reference order.

use colored::Colorize;
use sandbox_seed_store::{CollectionDef, StoreError, VectorStore};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("reference cycle between collections: {}", .0.join(", "))]
    Cycle(Vec<String>),
    #[error("collection {0} is declared twice")]
    Duplicate(String),
}

/// Order `defs` so every collection comes after the in-list collections it
/// references. Otherwise the declaration order is kept. References to
/// collections outside `defs` are assumed to already exist.
pub fn creation_order(defs: &[CollectionDef]) -> Result<Vec<&CollectionDef>, SchemaError> {
    for (i, def) in defs.iter().enumerate() {
        if defs[..i].iter().any(|d| d.name == def.name) {
            return Err(SchemaError::Duplicate(def.name.clone()));
        }
    }

    let in_list = |name: &str| defs.iter().any(|d| d.name == name);
    let mut placed: Vec<&CollectionDef> = Vec::with_capacity(defs.len());
    let mut pending: Vec<&CollectionDef> = defs.iter().collect();

    while !pending.is_empty() {
        let ready = pending.iter().position(|def| {
            def.references().all(|(_, target)| {
                target == def.name
                    || !in_list(target)
                    || placed.iter().any(|p| p.name == target)
            })
        });
        match ready {
            Some(i) => placed.push(pending.remove(i)),
            None => {
                return Err(SchemaError::Cycle(
                    pending.iter().map(|d| d.name.clone()).collect(),
                ))
            }
        }
    }
    Ok(placed)
}

/// Delete `def.name` if present, then create it.
///
/// Problems checking or deleting the old collection are reported and
/// tolerated; only the create call decides the outcome.
pub fn reset_collection<S>(store: &S, def: &CollectionDef) -> Result<(), StoreError>
where
    S: VectorStore + ?Sized,
{
    match store
        .collection_exists(&def.name)
        .and_then(|exists| if exists { store.delete_collection(&def.name) } else { Ok(false) })
    {
        Ok(true) => println!("{} Deleted existing {} collection", "✓".green(), def.name),
        Ok(false) => {}
        Err(err) => {
            tracing::warn!(collection = %def.name, error = %err, "could not delete existing collection");
            println!(
                "Note: Could not delete existing {} collection: {err}",
                def.name
            );
        }
    }

    store.create_collection(def)?;
    println!("{} {} collection created successfully!", "✓".green(), def.name);
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub created: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl SchemaReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Reset every collection in dependency order. A failed collection does not
/// stop the remaining ones from being attempted.
pub fn define_collections<S>(store: &S, defs: &[CollectionDef]) -> SchemaReport
where
    S: VectorStore + ?Sized,
{
    let mut report = SchemaReport::default();
    let ordered = match creation_order(defs) {
        Ok(ordered) => ordered,
        Err(err) => {
            println!("{} {err}", "✗".red());
            report.failed = defs
                .iter()
                .map(|d| (d.name.clone(), err.to_string()))
                .collect();
            return report;
        }
    };

    for def in ordered {
        println!("Creating {} collection...", def.name);
        match reset_collection(store, def) {
            Ok(()) => report.created.push(def.name.clone()),
            Err(err) => {
                tracing::warn!(collection = %def.name, error = %err, "collection creation failed");
                println!(
                    "{} Failed to create {} collection: {err}",
                    "✗".red(),
                    def.name
                );
                report.failed.push((def.name.clone(), err.to_string()));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use sandbox_seed_store::MemoryStore;

    fn names(defs: &[&CollectionDef]) -> Vec<String> {
        defs.iter().map(|d| d.name.clone()).collect()
    }

    #[test]
    fn dependents_are_moved_after_their_targets() {
        let defs = vec![catalog::review(), catalog::book(), catalog::publisher(), catalog::author()];
        let order = creation_order(&defs).unwrap();
        assert_eq!(names(&order), vec!["Publisher", "Author", "Book", "Review"]);
    }

    #[test]
    fn declaration_order_is_kept_when_already_valid() {
        let defs = catalog::book_domain();
        let order = creation_order(&defs).unwrap();
        assert_eq!(names(&order), vec!["Author", "Publisher", "Book", "Review"]);
    }

    #[test]
    fn cycles_and_duplicates_are_rejected() {
        let a = CollectionDef::new("A").reference("b", "B");
        let b = CollectionDef::new("B").reference("a", "A");
        assert!(matches!(
            creation_order(&[a.clone(), b]),
            Err(SchemaError::Cycle(_))
        ));
        assert_eq!(
            creation_order(&[a.clone(), a]),
            Err(SchemaError::Duplicate("A".into()))
        );
    }

    #[test]
    fn self_reference_is_not_a_cycle() {
        let person = CollectionDef::new("Person").reference("mentor", "Person");
        assert_eq!(creation_order(&[person]).unwrap().len(), 1);
    }

    #[test]
    fn failed_collection_does_not_stop_the_rest() {
        let store = MemoryStore::new();
        let broken = CollectionDef::new("lowercase").text("x");
        let defs = vec![broken, catalog::author(), catalog::publisher()];

        let report = define_collections(&store, &defs);
        assert_eq!(report.created, vec!["Author", "Publisher"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "lowercase");
        assert!(!report.is_complete());
    }

    #[test]
    fn reset_replaces_existing_collection() {
        let store = MemoryStore::new();
        store.create_collection(&catalog::author()).unwrap();
        reset_collection(&store, &catalog::author()).unwrap();
        assert_eq!(store.list_collections().unwrap(), vec!["Author"]);
    }
}
