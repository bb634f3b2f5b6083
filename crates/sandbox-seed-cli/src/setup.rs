//! Two-step orchestration: `books`, a pause, then `github`, each as a child
//! process of this same binary.

use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use sandbox_seed_store::config::API_KEY_ENV;

use crate::ConnectionArgs;

fn step_command(exe: &Path, conn: &ConnectionArgs, subcommand: &str) -> Command {
    let mut cmd = Command::new(exe);
    cmd.args(conn.forwarded_flags()).arg(subcommand);
    if let Ok(config) = conn.store_config() {
        cmd.env(API_KEY_ENV, config.api_key);
    }
    cmd
}

/// Run one subcommand in a child process; `true` when it exits with 0.
fn run_step(exe: &Path, conn: &ConnectionArgs, subcommand: &str, description: &str) -> bool {
    println!("\n{}", "=".repeat(60));
    println!("Running {description}");
    println!("{}", "=".repeat(60));

    let mut cmd = step_command(exe, conn, subcommand);
    tracing::debug!(subcommand, "spawning step");

    match cmd.status() {
        Ok(status) if status.success() => {
            println!("{} {description} completed successfully!", "✅".green());
            true
        }
        Ok(status) => {
            println!(
                "{} {description} failed with {}",
                "❌".red(),
                status
                    .code()
                    .map(|c| format!("return code {c}"))
                    .unwrap_or_else(|| "a signal".to_string())
            );
            false
        }
        Err(err) => {
            println!("{} Error running {description}: {err}", "❌".red());
            false
        }
    }
}

pub fn cmd_setup(conn: &ConnectionArgs, delay: Duration) -> Result<()> {
    // Steps are separate processes; an in-memory store dies with each one.
    if conn.in_memory {
        bail!("setup runs each step in a separate process and cannot share an --in-memory store; run `populate --in-memory` instead");
    }

    println!("🚀 Setting up sandbox test data");
    println!("This will create multiple collections with:");
    println!("  • Nested object properties");
    println!("  • Cross-references between collections");
    println!("  • Various data types (text, numbers, booleans, dates, geo coordinates)");
    println!("  • Real-world GitHub data");

    let exe = std::env::current_exe().context("cannot locate the sandbox-seed executable")?;

    let books = run_step(
        &exe,
        conn,
        "books",
        "Book Domain Setup (Books, Authors, Publishers, Reviews)",
    );
    if !books {
        println!("\n{} Setup failed. Please check the error messages above.", "❌".red());
        bail!("book domain step failed");
    }

    println!("\n⏳ Waiting {} seconds before next step...", delay.as_secs());
    thread::sleep(delay);

    let github = run_step(&exe, conn, "github", "GitHub Data Setup (Users, Repos, Issues)");
    if github {
        println!("\n🎉 ALL DATA SETUP COMPLETE!");
        println!("  • Author, Publisher, Book, Review (with nested properties & references)");
        println!("  • GitHubUser, GitHubRepo, GitHubIssue (real GitHub data)");
    } else {
        tracing::warn!("GitHub step failed; book data is still in place");
        println!(
            "\n{}  GitHub data setup failed, but the book collections were created successfully",
            "⚠️".yellow()
        );
        println!("You can still test nested properties and references with the book data");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use clap::Parser;
    use std::ffi::OsStr;

    #[test]
    fn steps_forward_flags_and_pass_the_key_through_the_environment() {
        let cli = Cli::parse_from([
            "sandbox-seed",
            "--port",
            "8081",
            "--api-key",
            "secret",
            "setup",
        ]);
        let cmd = step_command(Path::new("/bin/sandbox-seed"), &cli.connection, "books");

        let args: Vec<&OsStr> = cmd.get_args().collect();
        assert_eq!(args.last(), Some(&OsStr::new("books")));
        assert!(args.windows(2).any(|w| w == [OsStr::new("--port"), OsStr::new("8081")]));
        assert!(!args.contains(&OsStr::new("secret")));

        let key = cmd
            .get_envs()
            .find(|(name, _)| *name == OsStr::new(API_KEY_ENV))
            .and_then(|(_, value)| value);
        assert_eq!(key, Some(OsStr::new("secret")));
    }

    #[test]
    fn in_memory_setup_is_rejected_before_any_step_runs() {
        let cli = Cli::parse_from(["sandbox-seed", "--in-memory", "setup", "--delay-secs", "0"]);
        let err = cmd_setup(&cli.connection, Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("--in-memory"), "{err}");
    }
}
