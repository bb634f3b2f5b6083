//! Subcommands that seed or inspect a connected service.

use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use colored::Colorize;
use reqwest::blocking::Client;
use sandbox_seed_fixtures::catalog;
use sandbox_seed_fixtures::trivia::TRIVIA_FETCH_TIMEOUT;
use sandbox_seed_fixtures::{
    define_collections, describe_schemas, fetch_trivia_rows, load_book_domain, load_github,
    load_trivia, verify, GithubLimits, HttpGithubApi, LinkPolicy,
};
use sandbox_seed_store::{ThreadSleeper, VectorStore};

const GITHUB_TIMEOUT_SECS: u64 = 10;

pub struct PopulateOptions {
    pub skip_github: bool,
    pub verify_only: bool,
    pub github_users: Vec<String>,
    pub trivia_url: String,
    pub link_policy: LinkPolicy,
}

fn banner(title: &str) {
    println!("{title}");
    println!("{}", "=".repeat(60));
}

fn section(title: &str) {
    println!("\n=== {title} ===");
}

/// Schema first; loading is skipped for a domain whose collections did not
/// all come up. `false` when the collection or the download failed.
fn seed_trivia(store: &dyn VectorStore, trivia_url: &str) -> bool {
    section("Creating JeopardyQuestion collection");
    if !define_collections(store, &catalog::trivia_domain()).is_complete() {
        return false;
    }

    println!("Downloading Jeopardy sample data...");
    let client = Client::new();
    match fetch_trivia_rows(&client, trivia_url, TRIVIA_FETCH_TIMEOUT) {
        Ok(rows) => {
            println!("{} Downloaded {} sample questions", "✓".green(), rows.len());
            load_trivia(store, &rows);
            true
        }
        Err(err) => {
            tracing::warn!(error = %err, "trivia fixture download failed");
            println!("{} Failed to download Jeopardy data: {err}", "✗".red());
            false
        }
    }
}

fn seed_books(store: &dyn VectorStore, policy: LinkPolicy) -> bool {
    section("Creating Book Domain Collections");
    if !define_collections(store, &catalog::book_domain()).is_complete() {
        return false;
    }
    load_book_domain(store, policy);
    true
}

/// `None` when the collections could not be created; otherwise the number
/// of users imported (zero when fetching is skipped).
fn seed_github(store: &dyn VectorStore, users: Vec<String>, fetch: bool) -> Result<Option<usize>> {
    section("Creating GitHub Collections");
    if !define_collections(store, &catalog::github_domain()).is_complete() {
        return Ok(None);
    }
    if !fetch {
        println!("⏭️  Skipping GitHub data fetching (--skip-github)");
        return Ok(Some(0));
    }

    let api = HttpGithubApi::from_env(Duration::from_secs(GITHUB_TIMEOUT_SECS))
        .map_err(|e| anyhow!("could not build GitHub client: {e}"))?;
    let limits = GithubLimits::default().with_users(users);
    let report = load_github(store, &api, &limits, &ThreadSleeper);
    Ok(Some(report.users.succeeded()))
}

fn print_feature_guide() {
    println!("\n🧪 Things to explore:");
    println!("  1. Nested Properties:");
    println!("     - Author.address (street, city, country, zipCode)");
    println!("     - Book.metadata (language, edition, format, weight)");
    println!("     - GitHubUser.stats (publicRepos, followers, etc.)");
    println!("     - GitHubRepo.metrics (stars, forks, watchers)");
    println!("  2. Cross-References:");
    println!("     - Book → Author, Book → Publisher");
    println!("     - Review → Book");
    println!("     - GitHubRepo → GitHubUser");
    println!("     - GitHubIssue → GitHubRepo, GitHubIssue → GitHubUser");
    println!("  3. Data Types:");
    println!("     - Text, Numbers, Booleans, Dates, GeoCoordinates");
}

pub fn cmd_populate(store: &dyn VectorStore, opts: &PopulateOptions) -> Result<()> {
    banner("🚀 Sandbox Test Data Population");

    if opts.verify_only {
        println!("Running in verification-only mode...");
        verify(store).print();
        return Ok(());
    }

    println!("Creating test data with:");
    println!("  • Nested object properties");
    println!("  • Cross-references between collections");
    println!("  • Various data types (text, numbers, booleans, dates, geo coordinates)");
    if opts.skip_github {
        println!("  • Skipping GitHub data (--skip-github)");
    } else {
        println!("  • Real-world GitHub data");
    }

    let mut failed = Vec::new();
    if !seed_trivia(store, &opts.trivia_url) {
        failed.push("trivia");
    }
    if !seed_books(store, opts.link_policy) {
        failed.push("books");
    }
    if seed_github(store, opts.github_users.clone(), !opts.skip_github)?.is_none() {
        failed.push("github");
    }

    if !failed.is_empty() {
        println!(
            "\n{} Some collections failed to create. Check errors above.",
            "❌".red()
        );
        bail!("failed domains: {}", failed.join(", "));
    }

    verify(store).print();

    println!("\n🎉 SUCCESS!");
    println!("{}", "=".repeat(60));
    println!("The service now contains the sample test data.");
    print_feature_guide();
    Ok(())
}

pub fn cmd_books(store: &dyn VectorStore, policy: LinkPolicy) -> Result<()> {
    banner("📚 Book Domain Setup");
    if !seed_books(store, policy) {
        bail!("book domain collections could not be created");
    }
    verify(store).print();
    Ok(())
}

pub fn cmd_github(store: &dyn VectorStore, users: Vec<String>) -> Result<()> {
    banner("🐙 GitHub Data Setup");
    match seed_github(store, users, true)? {
        None => bail!("GitHub collections could not be created"),
        Some(0) => bail!("no GitHub users could be imported"),
        Some(_) => {}
    }
    verify(store).print();
    Ok(())
}

pub fn cmd_inspect(store: &dyn VectorStore) -> Result<()> {
    println!("\n📊 COLLECTIONS OVERVIEW");
    println!("{}", "=".repeat(50));
    let overview = describe_schemas(store)?;
    if overview.is_empty() {
        println!("No collections defined.");
    }
    for collection in &overview {
        collection.print();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox_seed_store::MemoryStore;

    #[test]
    fn books_command_seeds_and_verifies() {
        let store = MemoryStore::new();
        cmd_books(&store, LinkPolicy::default()).unwrap();
        assert_eq!(store.count(catalog::BOOK).unwrap(), 3);
        cmd_inspect(&store).unwrap();
    }

    #[test]
    fn unreachable_trivia_host_fails_populate_but_other_domains_load() {
        let store = MemoryStore::new();
        let opts = PopulateOptions {
            skip_github: true,
            verify_only: false,
            github_users: Vec::new(),
            trivia_url: "http://127.0.0.1:1/jeopardy.json".into(),
            link_policy: LinkPolicy::default(),
        };
        let err = cmd_populate(&store, &opts).unwrap_err();
        assert!(err.to_string().contains("trivia"));
        assert_eq!(store.count(catalog::AUTHOR).unwrap(), 3);
        assert_eq!(store.count(catalog::GITHUB_USER).unwrap(), 0);
    }

    #[test]
    fn verify_only_never_fails() {
        let store = MemoryStore::new();
        let opts = PopulateOptions {
            skip_github: true,
            verify_only: true,
            github_users: Vec::new(),
            trivia_url: String::new(),
            link_policy: LinkPolicy::Strict,
        };
        cmd_populate(&store, &opts).unwrap();
    }
}
