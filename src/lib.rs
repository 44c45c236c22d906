//! JWKS Catalog Crawler: fans a catalog of identity providers out onto Pub/Sub
//!
//! This crate fetches a YAML catalog of OpenID Connect providers, extracts every
//! OpenID configuration and JWKS URL it lists, and publishes one crawl request
//! per URL to a Pub/Sub topic for a downstream crawler to pick up.

pub mod bus;
pub mod catalog;
pub mod config;
pub mod pipeline;
pub mod publisher;

use thiserror::Error;

/// Main error type for crawler runs
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to connect to topic {topic}: {source}")]
    BusConnect { topic: String, source: BusError },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("{failed} of {attempted} crawl requests failed to publish")]
    PartialPublish { failed: usize, attempted: usize },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Why the catalog request itself did not succeed
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    #[error("status code {0}")]
    Status(u16),
}

/// Catalog loading errors; all of them are fatal for a run
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to fetch catalog from {url}: {source}")]
    Fetch { url: String, source: FetchFailure },

    #[error("Failed to read catalog body from {url}: {source}")]
    Read { url: String, source: reqwest::Error },

    #[error("Failed to parse catalog YAML from {url}: {source}")]
    Decode {
        url: String,
        source: serde_yaml::Error,
    },
}

impl CatalogError {
    /// HTTP status received from the catalog server, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Fetch {
                source: FetchFailure::Status(code),
                ..
            } => Some(*code),
            CatalogError::Fetch {
                source: FetchFailure::Transport(e),
                ..
            } => e.status().map(|s| s.as_u16()),
            CatalogError::Read { source, .. } => source.status().map(|s| s.as_u16()),
            CatalogError::Decode { .. } => None,
        }
    }
}

/// Message bus errors, either while resolving the topic or while publishing
#[derive(Debug, Error)]
pub enum BusError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Publish response carried no message id")]
    MissingMessageId,

    #[error("Topic handle is closed")]
    Closed,

    #[error("Publish task did not complete: {0}")]
    Task(String),
}

/// Per-target errors; recorded in the batch report, never fatal
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Failed to serialize crawl request: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to publish crawl request: {0}")]
    Publish(#[from] BusError),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for message bus operations
pub type BusResult<T> = std::result::Result<T, BusError>;

// Re-export commonly used types
pub use catalog::{extract_targets, load_catalog, Catalog, CrawlTarget, ServiceRecord};
pub use config::Config;
pub use pipeline::{exit_code, run, PartialFailurePolicy, RunSummary};
pub use publisher::{AbortHandle, AbortSignal, Publisher, PublishReport, TargetOutcome};
