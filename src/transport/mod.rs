//! HTTP transport shared by all gateway operations.

pub mod http;

pub use http::{ensure_success, read_json, HttpTransport, PendingCall, REQUEST_ID_HEADER};

use crate::{Error, ErrorContext, Result};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

/// Parse a base URL, rejecting anything that cannot carry path segments.
pub fn parse_base_url(raw: &str, field: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid base URL '{}': {}", raw, e),
            ErrorContext::new().with_field_path(field),
        )
    })?;
    if url.cannot_be_a_base() {
        return Err(Error::configuration_with_context(
            format!("base URL '{}' cannot carry a path", raw),
            ErrorContext::new().with_field_path(field),
        ));
    }
    Ok(url)
}

/// Append percent-encoded path segments to `base`, keeping any path prefix it has.
pub fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| {
            Error::configuration_with_context(
                format!("base URL '{}' cannot carry a path", base),
                ErrorContext::new().with_source("transport"),
            )
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
