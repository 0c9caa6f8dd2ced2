//! Error taxonomy.
//!
//! Config errors are fatal at startup. Fetch and extract errors are recovered
//! by the event loop and shown inline until the next successful cycle.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("markup is not an HTML document")]
    NotADocument,
    #[error("table layout changed: {table} column {column} header is {found:?}")]
    SchemaDrift {
        table: &'static str,
        column: usize,
        found: String,
    },
}

/// Why a refresh cycle produced no snapshot.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("failed to fetch data: {0}")]
    Fetch(#[from] FetchError),
    #[error("failed to parse data: {0}")]
    Extract(#[from] ExtractError),
}
