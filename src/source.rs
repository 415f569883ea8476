//! Where the feed bytes come from.

use std::path::PathBuf;
use tracing::info;

use crate::error::{Error, FetchError, ParseError};
use crate::fetch::{HttpClient, fetch_bytes};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Remote(String),
    Local(PathBuf),
}

impl FeedSource {
    /// Loads the raw feed from disk or over HTTP. `client` is only called
    /// for a remote source.
    ///
    /// An unreadable local file is reported as a [`ParseError`], since the
    /// input document is unavailable rather than the network.
    #[tracing::instrument(skip(client), fields(source = %self))]
    pub fn load<C, F>(&self, client: F) -> Result<Vec<u8>, Error>
    where
        C: HttpClient,
        F: FnOnce() -> Result<C, FetchError>,
    {
        match self {
            FeedSource::Remote(url) => Ok(fetch_bytes(&client()?, url)?),
            FeedSource::Local(path) => {
                let bytes = std::fs::read(path).map_err(|source| ParseError::Read {
                    path: path.clone(),
                    source,
                })?;
                info!(bytes = bytes.len(), "Feed loaded from file");
                Ok(bytes)
            }
        }
    }
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedSource::Remote(url) => f.write_str(url),
            FeedSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}
