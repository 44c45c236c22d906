use serde::{Deserialize, Serialize};
use std::fmt;

/// One identity-provider entry in the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceRecord {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// OpenID Connect discovery document URL
    #[serde(rename = "openid-configuration", default)]
    pub openid_configuration: Option<String>,

    /// JSON Web Key Set URL
    #[serde(default)]
    pub jwks_uri: Option<String>,
}

/// The decoded catalog document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub services: Vec<ServiceRecord>,
}

/// A single URL to hand to the downstream crawler
///
/// Only produced by extraction, which guarantees the URL is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrawlTarget(String);

impl CrawlTarget {
    /// Wraps a URL, returning `None` for an empty string
    pub fn new(url: impl Into<String>) -> Option<Self> {
        let url = url.into();
        if url.is_empty() {
            None
        } else {
            Some(Self(url))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message body published for each target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlRequest<'a> {
    pub url: &'a str,
}

impl<'a> CrawlRequest<'a> {
    pub fn for_target(target: &'a CrawlTarget) -> Self {
        Self {
            url: target.as_str(),
        }
    }

    /// Encodes the request as compact JSON
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
