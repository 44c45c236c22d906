use serde::Deserialize;

/// Main configuration structure for the crawler
///
/// Every field has a default so that a run can be configured entirely from
/// the environment; required values are enforced by validation instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub pubsub: PubSubConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Where the catalog document lives
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// URL of the YAML catalog
    #[serde(default)]
    pub url: String,
}

/// Pub/Sub destination and client settings
#[derive(Debug, Clone, Deserialize)]
pub struct PubSubConfig {
    /// Google Cloud project that owns the topic
    #[serde(rename = "project-id", default)]
    pub project_id: String,

    /// Topic name within the project
    #[serde(default)]
    pub topic: String,

    /// Base URL of the Pub/Sub REST API
    #[serde(default)]
    pub endpoint: Option<String>,

    /// host:port of a Pub/Sub emulator; disables authentication
    #[serde(rename = "emulator-host", default)]
    pub emulator_host: Option<String>,

    /// Pre-issued OAuth access token
    #[serde(rename = "access-token", default)]
    pub access_token: Option<String>,

    /// host:port of the GCE metadata server used to mint access tokens
    #[serde(rename = "metadata-host", default)]
    pub metadata_host: Option<String>,

    /// Maximum number of publishes awaiting acknowledgment at once
    #[serde(rename = "max-in-flight", default = "default_max_in_flight")]
    pub max_in_flight: u32,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            topic: String::new(),
            endpoint: None,
            emulator_host: None,
            access_token: None,
            metadata_host: None,
            max_in_flight: default_max_in_flight(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Run behavior
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunConfig {
    /// Treat any failed publish as a failed run
    #[serde(default)]
    pub strict: bool,
}

fn default_max_in_flight() -> u32 {
    1
}

fn default_user_agent() -> String {
    format!("jwks-catalog-crawler/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}
