//! sandbox-seed CLI
//!
//! Seeds a sandbox vector service with sample collections and checks the
//! result:
//! - `populate`: trivia, book and GitHub domains, then verification
//! - `books` / `github`: one domain each, then verification
//! - `inspect`: schema overview with object counts
//! - `setup`: `books` then `github` as child processes

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use sandbox_seed_fixtures::LinkPolicy;
use sandbox_seed_store::config::API_KEY_ENV;
use sandbox_seed_store::{
    wait_until_ready, HttpStore, MemoryStore, RetryPolicy, StoreConfig, ThreadSleeper,
    VectorStore,
};
use tracing_subscriber::EnvFilter;

mod commands;
mod setup;

#[derive(Parser)]
#[command(name = "sandbox-seed")]
#[command(
    author,
    version,
    about = "Seed a sandbox vector service with nested and cross-referenced sample data"
)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the service lives and how long to wait for it.
///
/// Unset flags fall back to `SANDBOX_SEED_*` variables, then to the sandbox
/// defaults (`http://localhost:8080`).
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    #[arg(long, global = true)]
    host: Option<String>,

    #[arg(long, global = true)]
    port: Option<u16>,

    /// `http` or `https`.
    #[arg(long, global = true)]
    scheme: Option<String>,

    #[arg(long, env = API_KEY_ENV, hide_env_values = true, global = true)]
    api_key: Option<String>,

    #[arg(long, global = true)]
    init_timeout_secs: Option<u64>,

    #[arg(long, global = true)]
    query_timeout_secs: Option<u64>,

    #[arg(long, global = true)]
    insert_timeout_secs: Option<u64>,

    /// Readiness probe attempts before giving up.
    #[arg(long, default_value_t = 10, global = true)]
    ready_attempts: u32,

    /// Pause between readiness attempts.
    #[arg(long, default_value_t = 2000, global = true)]
    ready_delay_ms: u64,

    /// Run against an in-process store instead of a live service.
    #[arg(long, global = true)]
    in_memory: bool,

    /// Fail dependent records that have no parent at their position instead
    /// of linking them to the first parent.
    #[arg(long, global = true)]
    strict_links: bool,
}

impl ConnectionArgs {
    pub fn store_config(&self) -> Result<StoreConfig> {
        let mut config = StoreConfig::from_env()?;
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(scheme) = &self.scheme {
            config.scheme = scheme.to_ascii_lowercase();
        }
        if let Some(key) = &self.api_key {
            config.api_key = key.clone();
        }
        if let Some(secs) = self.init_timeout_secs {
            config.init_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.query_timeout_secs {
            config.query_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.insert_timeout_secs {
            config.insert_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.ready_attempts, Duration::from_millis(self.ready_delay_ms))
    }

    pub fn link_policy(&self) -> LinkPolicy {
        if self.strict_links {
            LinkPolicy::Strict
        } else {
            LinkPolicy::FallbackToFirst
        }
    }

    /// Flags to hand to a child invocation of this binary. The API key goes
    /// through the environment instead.
    pub fn forwarded_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        let mut push = |name: &str, value: Option<String>| {
            if let Some(value) = value {
                flags.push(format!("--{name}"));
                flags.push(value);
            }
        };
        push("host", self.host.clone());
        push("port", self.port.map(|p| p.to_string()));
        push("scheme", self.scheme.clone());
        push("init-timeout-secs", self.init_timeout_secs.map(|s| s.to_string()));
        push("query-timeout-secs", self.query_timeout_secs.map(|s| s.to_string()));
        push("insert-timeout-secs", self.insert_timeout_secs.map(|s| s.to_string()));
        push("ready-attempts", Some(self.ready_attempts.to_string()));
        push("ready-delay-ms", Some(self.ready_delay_ms.to_string()));
        if self.in_memory {
            flags.push("--in-memory".to_string());
        }
        if self.strict_links {
            flags.push("--strict-links".to_string());
        }
        flags
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create and fill every sample collection, then verify.
    Populate {
        /// Create the GitHub collections but do not call the GitHub API.
        #[arg(long)]
        skip_github: bool,

        /// Only run the verification queries against existing data.
        #[arg(long)]
        verify_only: bool,

        /// GitHub users to import (repeatable; defaults to a fixed list).
        #[arg(long = "github-user")]
        github_users: Vec<String>,

        /// Trivia fixture location.
        #[arg(long, default_value = sandbox_seed_fixtures::TRIVIA_FIXTURE_URL)]
        trivia_url: String,
    },

    /// Author, Publisher, Book and Review collections with literal data.
    Books,

    /// GitHubUser, GitHubRepo and GitHubIssue collections from the live API.
    Github {
        /// GitHub users to import (repeatable; defaults to a fixed list).
        #[arg(long = "github-user")]
        github_users: Vec<String>,
    },

    /// Print each collection's properties, nested fields, references and count.
    Inspect,

    /// Run `books`, then `github` after a pause, as separate processes.
    ///
    /// A failing GitHub step only warns; the book data is still usable.
    /// Not available with `--in-memory`: each step would get its own store.
    Setup {
        /// Seconds to wait between the two steps.
        #[arg(long, default_value_t = 3)]
        delay_secs: u64,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Open the service handle and wait until it answers.
fn connect(args: &ConnectionArgs) -> Result<Box<dyn VectorStore>> {
    let store: Box<dyn VectorStore> = if args.in_memory {
        println!("{} Using in-memory store", "✓".green());
        Box::new(MemoryStore::new())
    } else {
        let config = args.store_config()?;
        let base = config.base_url()?;
        let store = HttpStore::connect(config).map_err(|e| {
            println!("{} Failed to connect to the vector service: {e}", "✗".red());
            println!("Make sure the service is running with: docker-compose up -d");
            anyhow!(e)
        })?;
        println!("{} Connected to {base}", "✓".green());
        Box::new(store)
    };

    println!("Checking if the service is ready...");
    let policy = args.retry_policy();
    wait_until_ready(store.as_ref(), policy, &ThreadSleeper)
        .map_err(|e| {
            println!(
                "{} Service is not ready after {} seconds",
                "✗".red(),
                policy.budget().as_secs()
            );
            anyhow!(e)
        })
        .context("vector service unavailable")?;
    println!("{} Service is ready", "✓".green());
    Ok(store)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let conn = &cli.connection;
    let policy = conn.link_policy();
    match cli.command {
        Commands::Populate {
            skip_github,
            verify_only,
            github_users,
            trivia_url,
        } => {
            let store = connect(conn)?;
            commands::cmd_populate(
                store.as_ref(),
                &commands::PopulateOptions {
                    skip_github,
                    verify_only,
                    github_users,
                    trivia_url,
                    link_policy: policy,
                },
            )
        }
        Commands::Books => commands::cmd_books(connect(conn)?.as_ref(), policy),
        Commands::Github { github_users } => {
            commands::cmd_github(connect(conn)?.as_ref(), github_users)
        }
        Commands::Inspect => commands::cmd_inspect(connect(conn)?.as_ref()),
        Commands::Setup { delay_secs } => {
            setup::cmd_setup(conn, Duration::from_secs(delay_secs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config_and_are_forwarded() {
        let cli = Cli::parse_from([
            "sandbox-seed",
            "--host",
            "weaviate",
            "--port",
            "9000",
            "--ready-attempts",
            "1",
            "--strict-links",
            "books",
        ]);
        let config = cli.connection.store_config().unwrap();
        assert_eq!(config.host, "weaviate");
        assert_eq!(config.port, 9000);
        assert_eq!(cli.connection.link_policy(), LinkPolicy::Strict);

        let flags = cli.connection.forwarded_flags();
        assert!(flags.windows(2).any(|w| w == ["--host", "weaviate"]));
        assert!(flags.windows(2).any(|w| w == ["--ready-attempts", "1"]));
        assert!(flags.contains(&"--strict-links".to_string()));
        assert!(!flags.iter().any(|f| f == "--api-key"));
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = Cli::parse_from(["sandbox-seed", "populate", "--skip-github", "--in-memory"]);
        assert!(cli.connection.in_memory);
        assert!(matches!(
            cli.command,
            Commands::Populate {
                skip_github: true,
                ..
            }
        ));
    }
}
