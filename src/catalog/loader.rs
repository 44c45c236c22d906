//! Catalog fetching and decoding
//!
//! This module handles the HTTP side of the crawler:
//! - Building the shared HTTP client with the configured user agent
//! - Fetching the catalog document with a single GET
//! - Classifying transport, status, read, and decode failures

use crate::catalog::types::Catalog;
use crate::config::HttpConfig;
use crate::{CatalogError, CrawlerError, FetchFailure};
use reqwest::Client;
use std::time::Duration;

/// Builds the HTTP client used for the catalog and for Pub/Sub
///
/// # Arguments
///
/// * `config` - The HTTP client configuration
///
/// # Errors
///
/// Returns `CrawlerError::HttpClient` when the client cannot be built, for
/// example when the user agent is not a valid header value.
///
/// # Example
///
/// ```no_run
/// use jwks_catalog_crawler::catalog::build_http_client;
/// use jwks_catalog_crawler::config::HttpConfig;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, CrawlerError> {
    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetches the catalog at `url` and decodes it
///
/// No retries and no caching: one request, one decode.
///
/// # Errors
///
/// | Condition | Error |
/// |-----------|-------|
/// | DNS, connect, or timeout failure | `CatalogError::Fetch` (transport) |
/// | Non-2xx status | `CatalogError::Fetch` (status) |
/// | Body cannot be read | `CatalogError::Read` |
/// | Body is not a catalog | `CatalogError::Decode` |
pub async fn load_catalog(client: &Client, url: &str) -> Result<Catalog, CatalogError> {
    tracing::debug!("Fetching catalog from {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CatalogError::Fetch {
            url: url.to_string(),
            source: FetchFailure::Transport(e),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(CatalogError::Fetch {
            url: url.to_string(),
            source: FetchFailure::Status(status.as_u16()),
        });
    }

    let body = response.bytes().await.map_err(|e| CatalogError::Read {
        url: url.to_string(),
        source: e,
    })?;

    tracing::debug!("Fetched {} bytes of catalog", body.len());

    parse_catalog(&body).map_err(|e| CatalogError::Decode {
        url: url.to_string(),
        source: e,
    })
}

/// Decodes catalog YAML
///
/// Unknown fields are ignored and missing optional fields decode to `None`.
pub fn parse_catalog(bytes: &[u8]) -> Result<Catalog, serde_yaml::Error> {
    serde_yaml::from_slice(bytes)
}
