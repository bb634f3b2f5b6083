use std::path::PathBuf;
use std::process::{Command, Output};

fn sandbox_seed_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_sandbox-seed"))
}

fn run(args: &[&str]) -> Output {
    Command::new(sandbox_seed_bin())
        .args(args)
        .env_remove("SANDBOX_SEED_HOST")
        .env_remove("SANDBOX_SEED_PORT")
        .env_remove("RUST_LOG")
        .output()
        .expect("run sandbox-seed")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn unreachable_service_exits_nonzero() {
    let output = run(&[
        "--host",
        "127.0.0.1",
        "--port",
        "1",
        "--ready-attempts",
        "1",
        "--ready-delay-ms",
        "0",
        "books",
    ]);
    assert_eq!(output.status.code(), Some(1), "{}", stdout(&output));
    assert!(stdout(&output).contains("Service is not ready"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("vector service unavailable"));
}

#[test]
fn books_against_memory_store_succeeds() {
    let output = run(&["--in-memory", "books"]);
    assert!(output.status.success(), "{}", stdout(&output));
    let out = stdout(&output);
    assert!(out.contains("Book Domain Setup"));
    assert!(out.contains("imported 3 out of 3 Author records"), "{out}");
    assert!(out.contains("City: Edinburgh"), "{out}");
}

#[test]
fn verify_only_on_an_empty_store_succeeds() {
    let output = run(&["--in-memory", "populate", "--verify-only"]);
    assert!(output.status.success(), "{}", stdout(&output));
    assert!(stdout(&output).contains("Found 0 collections"));
}

#[test]
fn inspect_on_an_empty_store_succeeds() {
    let output = run(&["inspect", "--in-memory"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No collections defined."));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let output = run(&["seed-everything"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn setup_refuses_an_in_memory_store() {
    let output = run(&["--in-memory", "setup", "--delay-secs", "0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--in-memory"));
    assert!(!stdout(&output).contains("Running Book Domain Setup"));
}
