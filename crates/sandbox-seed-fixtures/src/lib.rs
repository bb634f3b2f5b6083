//! Sample-data fixtures for a sandbox vector service.
//!
//! The catalog declares the collections, the definer resets them in reference
//! order, and the loaders fill them from literal data, a downloaded trivia
//! file and the public GitHub API. Every loader keeps going after a failed
//! insert and hands back a [`BatchReport`] instead of aborting.
//!
//! All functions take the service as an explicit [`VectorStore`] handle, so
//! tests run them against [`sandbox_seed_store::MemoryStore`].
//!
//! [`VectorStore`]: sandbox_seed_store::VectorStore

pub mod batch;
pub mod books;
pub mod catalog;
pub mod definer;
pub mod github;
pub mod link;
pub mod trivia;
pub mod verify;

pub use batch::{insert_batch, insert_prepared, BatchReport, InsertFailure};
pub use books::{load_book_domain, BookDomainReport};
pub use definer::{creation_order, define_collections, reset_collection, SchemaError, SchemaReport};
pub use github::{load_github, GithubApi, GithubLimits, GithubReport, HttpGithubApi};
pub use link::{insert_linked_batch, link_positional, LinkError, LinkPolicy};
pub use trivia::{fetch_trivia_rows, load_trivia, trivia_record, TRIVIA_FIXTURE_URL};
pub use verify::{describe_schemas, verify, ProbeOutcome, VerificationReport};

use sandbox_seed_store::StoreError;

/// Errors from fetching or mapping external fixture data.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed entry: {0}")]
    Malformed(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
