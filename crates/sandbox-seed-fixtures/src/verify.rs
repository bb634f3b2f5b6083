//! Read-side checks after seeding: counts, a nested fetch, reference traversal.
//!
//! Nothing here fails the run. Query errors turn into `None` counts or a
//! [`ProbeOutcome::Failed`] that is printed as a warning.

use colored::Colorize;
use sandbox_seed_store::{CollectionDef, FieldDef, GetQuery, Selection, StoreError, VectorStore};
use serde_json::Value;

use crate::catalog::{AUTHOR, BOOK, GITHUB_REPO, GITHUB_USER, PUBLISHER};

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Passed {
        headline: String,
        details: Vec<String>,
    },
    /// The query worked but returned no rows.
    Empty,
    Failed(String),
}

impl ProbeOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, ProbeOutcome::Passed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub title: &'static str,
    /// What the probe reads, for the "no rows" warning.
    pub subject: &'static str,
    pub outcome: ProbeOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    /// Collection name with its object count; `None` when counting failed.
    pub collections: Vec<(String, Option<u64>)>,
    pub probes: Vec<Probe>,
    /// Set when the collections could not even be listed.
    pub listing_error: Option<String>,
}

impl VerificationReport {
    pub fn count(&self, collection: &str) -> Option<u64> {
        self.collections
            .iter()
            .find(|(name, _)| name == collection)
            .and_then(|(_, count)| *count)
    }

    pub fn probe(&self, title: &str) -> Option<&ProbeOutcome> {
        self.probes
            .iter()
            .find(|p| p.title == title)
            .map(|p| &p.outcome)
    }

    pub fn print(&self) {
        println!("\n=== Verifying Collections ===");
        if let Some(err) = &self.listing_error {
            println!("{} Verification failed: {err}", "⚠".yellow());
            return;
        }

        println!("{} Found {} collections:", "✓".green(), self.collections.len());
        for (name, count) in &self.collections {
            println!("  • {name}");
            match count {
                Some(n) => println!("    Objects: {n}"),
                None => println!("    Objects: {}", "unknown".dimmed()),
            }
        }

        for probe in &self.probes {
            println!("\n=== Testing {} ===", probe.title);
            match &probe.outcome {
                ProbeOutcome::Passed { headline, details } => {
                    println!("{} {headline}", "✓".green());
                    for line in details {
                        println!("  - {line}");
                    }
                }
                ProbeOutcome::Empty => println!(
                    "{} Warning: No {} returned in {} test",
                    "⚠".yellow(),
                    probe.subject,
                    probe.title.to_lowercase()
                ),
                ProbeOutcome::Failed(reason) => println!(
                    "{} Warning: {} test failed: {reason}",
                    "⚠".yellow(),
                    probe.title
                ),
            }
        }
    }
}

fn text(row: &Value, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "Unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

/// References come back as a list of linked objects; we only show the first.
fn linked<'a>(row: &'a Value, field: &str) -> Option<&'a Value> {
    match row.get(field)? {
        Value::Array(items) => items.first(),
        obj @ Value::Object(_) => Some(obj),
        _ => None,
    }
}

fn nested<'a>(row: &'a Value, field: &str) -> Result<&'a Value, String> {
    row.get(field)
        .filter(|v| v.is_object())
        .ok_or_else(|| format!("{field} is missing from the response"))
}

fn run_query<S, F>(store: &S, query: &GetQuery, describe: F) -> ProbeOutcome
where
    S: VectorStore + ?Sized,
    F: FnOnce(&[Value]) -> Result<(String, Vec<String>), String>,
{
    match store.get(query) {
        Ok(rows) if rows.is_empty() => ProbeOutcome::Empty,
        Ok(rows) => match describe(&rows) {
            Ok((headline, details)) => ProbeOutcome::Passed { headline, details },
            Err(reason) => ProbeOutcome::Failed(reason),
        },
        Err(err) => ProbeOutcome::Failed(err.to_string()),
    }
}

fn basic_fetch<S: VectorStore + ?Sized>(store: &S) -> ProbeOutcome {
    match store.fetch_objects(AUTHOR, 1) {
        Ok(objects) => match objects.first() {
            Some(obj) => ProbeOutcome::Passed {
                headline: format!(
                    "Basic fetch test passed - Author: {}",
                    text(&Value::Object(obj.properties.clone()), "name")
                ),
                details: vec![format!("id: {}", obj.id)],
            },
            None => ProbeOutcome::Empty,
        },
        Err(err) => ProbeOutcome::Failed(err.to_string()),
    }
}

fn author_nested<S: VectorStore + ?Sized>(store: &S) -> ProbeOutcome {
    let query = GetQuery::new(AUTHOR, 1)
        .select(Selection::field("name"))
        .select(Selection::nested("address", &["city", "country"]))
        .select(Selection::nested("coordinates", &["latitude", "longitude"]));
    run_query(store, &query, |rows| {
        let author = &rows[0];
        let address = nested(author, "address")?;
        let coordinates = nested(author, "coordinates")?;
        Ok((
            format!("Nested properties test passed - Author: {}", text(author, "name")),
            vec![
                format!("City: {}", text(address, "city")),
                format!(
                    "Coordinates: {}, {}",
                    text(coordinates, "latitude"),
                    text(coordinates, "longitude")
                ),
            ],
        ))
    })
}

fn book_references<S: VectorStore + ?Sized>(store: &S) -> ProbeOutcome {
    let query = GetQuery::new(BOOK, 1)
        .select(Selection::field("title"))
        .select(Selection::reference("writtenBy", AUTHOR, &["name", "birthYear"]))
        .select(Selection::reference("publishedBy", PUBLISHER, &["name", "foundedYear"]));
    run_query(store, &query, |rows| {
        let book = &rows[0];
        let author = linked(book, "writtenBy").ok_or("writtenBy is not linked")?;
        let publisher = linked(book, "publishedBy").ok_or("publishedBy is not linked")?;
        Ok((
            format!("Cross-reference test passed - Book: {}", text(book, "title")),
            vec![
                format!("Author: {}", text(author, "name")),
                format!("Publisher: {}", text(publisher, "name")),
            ],
        ))
    })
}

fn github_user_nested<S: VectorStore + ?Sized>(store: &S) -> ProbeOutcome {
    let query = GetQuery::new(GITHUB_USER, 2)
        .select(Selection::field("name"))
        .select(Selection::field("login"))
        .select(Selection::nested("stats", &["publicRepos", "followers"]))
        .select(Selection::nested("urls", &["htmlUrl", "blog"]));
    run_query(store, &query, |rows| {
        let user = &rows[0];
        let stats = nested(user, "stats")?;
        Ok((
            format!("GitHub nested properties test passed - Found {} users", rows.len()),
            vec![
                format!("{} (@{})", text(user, "name"), text(user, "login")),
                format!(
                    "Repos: {}, Followers: {}",
                    text(stats, "publicRepos"),
                    text(stats, "followers")
                ),
            ],
        ))
    })
}

fn github_repo_owner<S: VectorStore + ?Sized>(store: &S) -> ProbeOutcome {
    let query = GetQuery::new(GITHUB_REPO, 2)
        .select(Selection::field("name"))
        .select(Selection::field("description"))
        .select(Selection::field("language"))
        .select(Selection::nested("metrics", &["stargazersCount", "forksCount"]))
        .select(Selection::reference("ownedBy", GITHUB_USER, &["name", "login"]));
    run_query(store, &query, |rows| {
        let repo = &rows[0];
        let owner = linked(repo, "ownedBy").ok_or("ownedBy is not linked")?;
        let metrics = nested(repo, "metrics")?;
        Ok((
            format!("GitHub cross-reference test passed - Found {} repos", rows.len()),
            vec![
                format!("{} ({})", text(repo, "name"), text(repo, "language")),
                format!("Owner: {} (@{})", text(owner, "name"), text(owner, "login")),
                format!(
                    "Stars: {}, Forks: {}",
                    text(metrics, "stargazersCount"),
                    text(metrics, "forksCount")
                ),
            ],
        ))
    })
}

/// Count every collection, then run the probes whose collection exists.
pub fn verify<S: VectorStore + ?Sized>(store: &S) -> VerificationReport {
    let mut report = VerificationReport::default();
    let names = match store.list_collections() {
        Ok(names) => names,
        Err(err) => {
            tracing::warn!(error = %err, "could not list collections");
            report.listing_error = Some(err.to_string());
            return report;
        }
    };

    for name in &names {
        let count = match store.count(name) {
            Ok(n) => Some(n),
            Err(err) => {
                tracing::warn!(collection = %name, error = %err, "count failed");
                None
            }
        };
        report.collections.push((name.clone(), count));
    }

    let has = |c: &str| names.iter().any(|n| n == c);
    let probes: [(&str, &'static str, &'static str, fn(&S) -> ProbeOutcome); 5] = [
        (AUTHOR, "Basic Fetch", "authors", basic_fetch::<S>),
        (AUTHOR, "Nested Properties", "authors", author_nested::<S>),
        (BOOK, "Cross-References", "books", book_references::<S>),
        (GITHUB_USER, "GitHub Nested Properties", "users", github_user_nested::<S>),
        (GITHUB_REPO, "GitHub Cross-References", "repos", github_repo_owner::<S>),
    ];
    for (collection, title, subject, run) in probes {
        if !has(collection) {
            continue;
        }
        let outcome = run(store);
        if let ProbeOutcome::Failed(reason) = &outcome {
            tracing::warn!(probe = title, %reason, "verification probe failed");
        }
        report.probes.push(Probe {
            title,
            subject,
            outcome,
        });
    }
    report
}

/// One collection in the schema overview.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionOverview {
    pub name: String,
    /// The stored definition, or why it could not be read.
    pub definition: Result<CollectionDef, String>,
    pub count: Option<u64>,
}

impl CollectionOverview {
    pub fn print(&self) {
        println!("\n{}", self.name.bold());
        match &self.definition {
            Ok(def) => {
                let mut references = Vec::new();
                println!("   Properties:");
                for field in &def.fields {
                    match field {
                        FieldDef::Scalar(p) => {
                            println!("     • {} ({})", p.name, p.data_type.wire_name())
                        }
                        FieldDef::Object { name, fields } => {
                            println!("     • {name} (object)");
                            for p in fields {
                                println!("       ↳ {} ({})", p.name, p.data_type.wire_name());
                            }
                        }
                        FieldDef::Reference { name, target } => references.push((name, target)),
                    }
                }
                if !references.is_empty() {
                    println!("   References:");
                    for (name, target) in references {
                        println!("     • {name} → {target}");
                    }
                }
            }
            Err(reason) => println!(
                "   {} Could not get detailed config: {reason}",
                "⚠".yellow()
            ),
        }
        match self.count {
            Some(n) => println!("   Objects: {n}"),
            None => println!("   Objects: unknown"),
        }
    }
}

/// Definitions and counts of every collection currently in the service.
pub fn describe_schemas<S: VectorStore + ?Sized>(
    store: &S,
) -> Result<Vec<CollectionOverview>, StoreError> {
    let names = store.list_collections()?;
    Ok(names
        .into_iter()
        .map(|name| {
            let definition = store.collection_schema(&name).map_err(|err| {
                tracing::warn!(collection = %name, error = %err, "could not read schema");
                err.to_string()
            });
            let count = store.count(&name).ok();
            CollectionOverview {
                name,
                definition,
                count,
            }
        })
        .collect())
}
