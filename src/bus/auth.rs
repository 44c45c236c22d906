//! Access tokens for the Pub/Sub REST API

use crate::{BusError, BusResult};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default host of the GCE metadata server
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// Path of the default service account's token on the metadata server
const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// How requests to the bus are authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// No Authorization header (emulator)
    Anonymous,
    /// Fixed bearer token
    Static(String),
    /// Tokens minted by the metadata server at `token_url`
    Metadata { token_url: String },
}

impl Credentials {
    /// Metadata server credentials for `host`, or the default metadata host
    pub fn metadata(host: Option<&str>) -> Self {
        let host = host.unwrap_or(DEFAULT_METADATA_HOST);
        Credentials::Metadata {
            token_url: format!("http://{}{}", host, METADATA_TOKEN_PATH),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Attaches credentials to outgoing requests, caching minted tokens
#[derive(Debug)]
pub struct TokenProvider {
    credentials: Credentials,
    client: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(client: Client, credentials: Credentials) -> Self {
        Self {
            credentials,
            client,
            cached: Mutex::new(None),
        }
    }

    /// Adds an Authorization header to `request` when credentials require one
    pub async fn authorize(&self, request: RequestBuilder) -> BusResult<RequestBuilder> {
        match &self.credentials {
            Credentials::Anonymous => Ok(request),
            Credentials::Static(token) => Ok(request.bearer_auth(token)),
            Credentials::Metadata { token_url } => {
                let token = self.metadata_token(token_url).await?;
                Ok(request.bearer_auth(token))
            }
        }
    }

    async fn metadata_token(&self, token_url: &str) -> BusResult<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.token.clone());
            }
        }

        tracing::debug!("Requesting access token from {}", token_url);

        let response = self
            .client
            .get(token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| BusError::Auth(format!("metadata server unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BusError::Auth(format!(
                "metadata server returned status {}",
                status.as_u16()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| BusError::Auth(format!("invalid token response: {}", e)))?;

        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            token: body.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(body.access_token)
    }
}
