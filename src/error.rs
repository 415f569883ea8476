//! Error types for each pipeline stage.

use std::path::PathBuf;
use thiserror::Error;

/// Network failures while downloading the feed. Always fatal.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid feed URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Document-level failures: the feed cannot be read or is not DATEX II.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("cannot read feed file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("feed is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("unexpected root element <{0}>, expected a DATEX II payload")]
    UnexpectedRoot(String),
}

/// Failure writing one output artifact.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV export to {} failed: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("cannot serialize map markers: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid setting in {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

/// Failure obtaining the feed bytes.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
