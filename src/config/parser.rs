use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable holding the catalog URL
pub const ENV_CATALOG_URL: &str = "YAML_CATALOG_URL";
/// Environment variable holding the Google Cloud project id
pub const ENV_PROJECT_ID: &str = "GCP_PROJECT_ID";
/// Environment variable holding the Pub/Sub topic name
pub const ENV_TOPIC_NAME: &str = "PUBSUB_TOPIC_NAME";
/// Environment variable pointing at a Pub/Sub emulator
pub const ENV_EMULATOR_HOST: &str = "PUBSUB_EMULATOR_HOST";
/// Environment variable holding a pre-issued access token
pub const ENV_ACCESS_TOKEN: &str = "PUBSUB_ACCESS_TOKEN";
/// Environment variable overriding the metadata server host
pub const ENV_METADATA_HOST: &str = "GCE_METADATA_HOST";

/// Loads the configuration from an optional TOML file and the process environment
///
/// The file (when given) is read first, environment variables override it,
/// and the merged result is validated.
///
/// # Arguments
///
/// * `path` - Optional path to a TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to read, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use jwks_catalog_crawler::config::load_config;
///
/// let config = load_config(None).unwrap();
/// println!("Publishing to {}", config.pubsub.topic);
/// ```
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_from(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`], with the environment supplied by `lookup`
pub fn load_config_from<F>(path: Option<&Path>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => parse_config(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };

    apply_env_overrides(&mut config, lookup);
    validate(&config)?;

    Ok(config)
}

/// Parses TOML configuration text without validating it
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Overrides configuration values with non-empty environment variables
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

    if let Some(url) = get(ENV_CATALOG_URL) {
        config.catalog.url = url;
    }
    if let Some(project_id) = get(ENV_PROJECT_ID) {
        config.pubsub.project_id = project_id;
    }
    if let Some(topic) = get(ENV_TOPIC_NAME) {
        config.pubsub.topic = topic;
    }
    if let Some(host) = get(ENV_EMULATOR_HOST) {
        config.pubsub.emulator_host = Some(host);
    }
    if let Some(token) = get(ENV_ACCESS_TOKEN) {
        config.pubsub.access_token = Some(token);
    }
    if let Some(host) = get(ENV_METADATA_HOST) {
        config.pubsub.metadata_host = Some(host);
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the file they used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns it with the hash of the file it came from
///
/// The hash is `None` when no file was given.
pub fn load_config_with_hash(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    let config = load_config(path)?;
    let hash = path.map(compute_config_hash).transpose()?;
    Ok((config, hash))
}
