//! Configuration module for the crawler
//!
//! This module handles loading configuration from an optional TOML file and
//! the process environment, then validating the merged result.
//!
//! # Example
//!
//! ```no_run
//! use jwks_catalog_crawler::config::load_config;
//!
//! let config = load_config(None).unwrap();
//! println!("Catalog: {}", config.catalog.url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CatalogConfig, Config, HttpConfig, PubSubConfig, RunConfig};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_from,
    load_config_with_hash, parse_config, ENV_ACCESS_TOKEN, ENV_CATALOG_URL, ENV_EMULATOR_HOST,
    ENV_METADATA_HOST, ENV_PROJECT_ID, ENV_TOPIC_NAME,
};
