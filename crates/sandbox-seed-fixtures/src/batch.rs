//! One-at-a-time inserts with a running success/failure tally.

use colored::Colorize;
use sandbox_seed_store::{ObjectId, Record, VectorStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertFailure {
    pub label: String,
    pub reason: String,
}

/// Outcome of inserting a batch into one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub collection: String,
    pub inserted: Vec<(String, ObjectId)>,
    pub failures: Vec<InsertFailure>,
}

impl BatchReport {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            ..Self::default()
        }
    }

    pub fn attempted(&self) -> usize {
        self.inserted.len() + self.failures.len()
    }

    pub fn succeeded(&self) -> usize {
        self.inserted.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Ids in insertion order, for linking dependent records.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.inserted.iter().map(|(_, id)| *id).collect()
    }

    pub fn record_success(&mut self, label: &str, id: ObjectId) {
        self.inserted.push((label.to_string(), id));
    }

    pub fn record_failure(&mut self, label: &str, reason: impl ToString) {
        let reason = reason.to_string();
        tracing::warn!(collection = %self.collection, record = label, %reason, "insert failed");
        self.failures.push(InsertFailure {
            label: label.to_string(),
            reason,
        });
    }

    /// Insert one record and account for the outcome.
    pub fn insert<S>(&mut self, store: &S, record: &Record) -> Option<ObjectId>
    where
        S: VectorStore + ?Sized,
    {
        match store.insert(&self.collection, record) {
            Ok(id) => {
                self.record_success(&record.label, id);
                Some(id)
            }
            Err(err) => {
                self.record_failure(&record.label, &err);
                None
            }
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "imported {} out of {} {} records",
            self.succeeded(),
            self.attempted(),
            self.collection
        )
    }
}

/// Insert `records` one by one. A failure is logged and counted; the rest of
/// the batch still runs. With `progress_every > 0` a progress line is printed
/// every that many records; otherwise each record is reported individually.
pub fn insert_batch<S>(
    store: &S,
    collection: &str,
    records: &[Record],
    progress_every: usize,
) -> BatchReport
where
    S: VectorStore + ?Sized,
{
    insert_prepared(
        store,
        collection,
        records.iter().cloned().map(Ok),
        progress_every,
    )
}

/// Like [`insert_batch`], for records built from external data where some
/// entries were already rejected while mapping them. Rejected entries count
/// as failures at their position in the batch.
pub fn insert_prepared<S, I>(
    store: &S,
    collection: &str,
    prepared: I,
    progress_every: usize,
) -> BatchReport
where
    S: VectorStore + ?Sized,
    I: IntoIterator<Item = Result<Record, InsertFailure>>,
{
    let mut report = BatchReport::new(collection);
    for (i, entry) in prepared.into_iter().enumerate() {
        let before = report.failed();
        let inserted = match entry {
            Ok(record) => report.insert(store, &record).map(|_| record.label),
            Err(rejected) => {
                report.record_failure(&rejected.label, rejected.reason);
                None
            }
        };

        match (inserted, report.failures.get(before)) {
            (Some(label), _) if progress_every == 0 => {
                println!("{} Inserted {label}", "✓".green());
            }
            (None, Some(failure)) if progress_every == 0 => println!(
                "{} Failed to insert {}: {}",
                "✗".red(),
                failure.label,
                failure.reason
            ),
            (None, Some(failure)) => {
                println!("Failed to insert {}: {}", failure.label, failure.reason)
            }
            _ => {}
        }
        if progress_every > 0 && (i + 1) % progress_every == 0 {
            println!("Imported {} {collection} records...", i + 1);
        }
    }
    tracing::info!(
        collection,
        succeeded = report.succeeded(),
        failed = report.failed(),
        "batch finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox_seed_store::{CollectionDef, MemoryStore};
    use serde_json::json;

    fn scores(values: &[serde_json::Value]) -> Vec<Record> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Record::new(format!("score {i}")).property("points", v.clone()))
            .collect()
    }

    #[test]
    fn failures_are_counted_and_the_batch_continues() {
        let store = MemoryStore::new();
        store
            .create_collection(&CollectionDef::new("Score").int("points"))
            .unwrap();

        let records = scores(&[json!(1), json!("two"), json!(3), json!(4.5), json!(5)]);
        let report = insert_batch(&store, "Score", &records, 0);

        assert_eq!(report.attempted(), 5);
        assert_eq!(report.succeeded(), 3);
        assert_eq!(
            report
                .failures
                .iter()
                .map(|f| f.label.as_str())
                .collect::<Vec<_>>(),
            vec!["score 1", "score 3"]
        );
        assert_eq!(store.count("Score").unwrap(), 3);
        assert_eq!(report.summary(), "imported 3 out of 5 Score records");
    }

    #[test]
    fn missing_collection_fails_every_record() {
        let store = MemoryStore::new();
        let report = insert_batch(&store, "Nowhere", &scores(&[json!(1), json!(2)]), 10);
        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.failed(), 2);
        assert!(report.ids().is_empty());
    }

    #[test]
    fn rejected_entries_keep_their_position() {
        let store = MemoryStore::new();
        store
            .create_collection(&CollectionDef::new("Score").int("points"))
            .unwrap();

        let prepared = vec![
            Ok(Record::new("a").property("points", json!(1))),
            Err(InsertFailure {
                label: "b".into(),
                reason: "missing points".into(),
            }),
            Ok(Record::new("c").property("points", json!(3))),
        ];
        let report = insert_prepared(&store, "Score", prepared, 1);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failures[0].label, "b");
        assert_eq!(
            report.inserted.iter().map(|(l, _)| l.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );
    }
}
