use crate::config::parser::{ENV_CATALOG_URL, ENV_PROJECT_ID, ENV_TOPIC_NAME};
use crate::config::types::{Config, HttpConfig, PubSubConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound for concurrent publishes
const MAX_IN_FLIGHT_LIMIT: u32 = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_required(config)?;
    validate_catalog_url(&config.catalog.url)?;
    validate_pubsub_config(&config.pubsub)?;
    validate_http_config(&config.http)?;
    Ok(())
}

/// Checks that every required value is present, reporting all missing ones at once
fn validate_required(config: &Config) -> Result<(), ConfigError> {
    let mut missing = Vec::new();

    if config.catalog.url.is_empty() {
        missing.push(ENV_CATALOG_URL);
    }
    if config.pubsub.project_id.is_empty() {
        missing.push(ENV_PROJECT_ID);
    }
    if config.pubsub.topic.is_empty() {
        missing.push(ENV_TOPIC_NAME);
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Missing(missing))
    }
}

/// Validates the catalog URL
fn validate_catalog_url(url: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid catalog url '{}': {}", url, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "Catalog url '{}' must use http or https",
            url
        )));
    }

    Ok(())
}

/// Validates Pub/Sub configuration
fn validate_pubsub_config(config: &PubSubConfig) -> Result<(), ConfigError> {
    validate_resource_name("project-id", &config.project_id)?;
    validate_resource_name("topic", &config.topic)?;

    if config.max_in_flight < 1 || config.max_in_flight > MAX_IN_FLIGHT_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-in-flight must be between 1 and {}, got {}",
            MAX_IN_FLIGHT_LIMIT, config.max_in_flight
        )));
    }

    if let Some(endpoint) = &config.endpoint {
        Url::parse(endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid pubsub endpoint '{}': {}", endpoint, e))
        })?;
    }

    for (name, host) in [
        ("emulator-host", &config.emulator_host),
        ("metadata-host", &config.metadata_host),
    ] {
        if let Some(host) = host {
            if host.is_empty() || host.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "{} must be a bare host[:port], got '{}'",
                    name, host
                )));
            }
        }
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Project ids and topic names end up in URL paths, so keep them to one segment
fn validate_resource_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value
        .chars()
        .any(|c| c == '/' || c == '?' || c == '#' || c.is_whitespace())
    {
        return Err(ConfigError::Validation(format!(
            "{} contains characters not allowed in a resource name: '{}'",
            field, value
        )));
    }
    Ok(())
}
