//! HTTP download of the live feed.

mod basic;
mod client;

pub use basic::{BasicClient, DEFAULT_TIMEOUT};
pub use client::HttpClient;

use tracing::{debug, info};

use crate::error::FetchError;

/// Downloads `url` in a single attempt.
///
/// # Errors
///
/// Returns a [`FetchError`] if the URL is invalid, the request fails in
/// transport, or the server answers with a non-success status.
#[tracing::instrument(skip(client))]
pub fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let req = reqwest::blocking::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;

    let status = resp.status();
    debug!(%status, "Feed response received");
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let bytes = resp.bytes().map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;
    info!(bytes = bytes.len(), "Feed downloaded");
    Ok(bytes.to_vec())
}
