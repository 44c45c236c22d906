//! Google Cloud Pub/Sub over the v1 REST API
//!
//! - Topic resolution: `GET /v1/projects/{project}/topics/{topic}`
//! - Publishing: `POST /v1/projects/{project}/topics/{topic}:publish`
//!
//! Message data travels base64-encoded, as the REST API requires.

use crate::bus::auth::{Credentials, TokenProvider};
use crate::bus::traits::{MessageBus, MessageId, TopicHandle, TopicPath};
use crate::config::PubSubConfig;
use crate::{BusError, BusResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Production Pub/Sub endpoint
pub const DEFAULT_ENDPOINT: &str = "https://pubsub.googleapis.com";

#[derive(Debug, Serialize)]
struct PublishRequest {
    messages: Vec<PubsubMessage>,
}

#[derive(Debug, Serialize)]
struct PubsubMessage {
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

/// Pub/Sub client that opens [`PubSubTopic`] handles
#[derive(Debug)]
pub struct PubSubBus {
    client: Client,
    endpoint: String,
    auth: Arc<TokenProvider>,
}

impl PubSubBus {
    pub fn new(client: Client, endpoint: impl Into<String>, credentials: Credentials) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            auth: Arc::new(TokenProvider::new(client.clone(), credentials)),
            client,
            endpoint,
        }
    }

    /// Builds a bus from configuration
    ///
    /// An emulator host takes precedence over everything else and disables
    /// authentication. Otherwise a static access token is used when given,
    /// falling back to the metadata server.
    pub fn from_config(client: Client, config: &PubSubConfig) -> Self {
        if let Some(host) = &config.emulator_host {
            tracing::info!("Using Pub/Sub emulator at {}", host);
            return Self::new(client, format!("http://{}", host), Credentials::Anonymous);
        }

        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let credentials = match &config.access_token {
            Some(token) => Credentials::Static(token.clone()),
            None => Credentials::metadata(config.metadata_host.as_deref()),
        };

        Self::new(client, endpoint, credentials)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn topic_url(&self, topic: &TopicPath) -> String {
        format!("{}/v1/{}", self.endpoint, topic)
    }
}

impl MessageBus for PubSubBus {
    type Handle = PubSubTopic;

    fn open(&self, topic: &TopicPath) -> impl Future<Output = BusResult<PubSubTopic>> + Send {
        let url = self.topic_url(topic);
        let name = topic.to_string();

        async move {
            tracing::debug!("Resolving topic {}", name);

            let request = self.auth.authorize(self.client.get(&url)).await?;
            let response = request.send().await?;

            match response.status() {
                status if status.is_success() => {}
                StatusCode::NOT_FOUND => return Err(BusError::TopicNotFound(name)),
                _ => return Err(status_error(response).await),
            }

            Ok(PubSubTopic {
                client: self.client.clone(),
                auth: Arc::clone(&self.auth),
                publish_url: format!("{}:publish", url),
                name,
                published: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            })
        }
    }
}

/// A resolved Pub/Sub topic
#[derive(Debug)]
pub struct PubSubTopic {
    client: Client,
    auth: Arc<TokenProvider>,
    publish_url: String,
    name: String,
    published: AtomicU64,
    closed: AtomicBool,
}

impl PubSubTopic {
    /// Number of messages acknowledged through this handle
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl TopicHandle for PubSubTopic {
    fn publish(&self, payload: Vec<u8>) -> impl Future<Output = BusResult<MessageId>> + Send {
        async move {
            if self.closed.load(Ordering::Acquire) {
                return Err(BusError::Closed);
            }

            let body = PublishRequest {
                messages: vec![PubsubMessage {
                    data: STANDARD.encode(&payload),
                }],
            };

            let request = self
                .auth
                .authorize(self.client.post(&self.publish_url))
                .await?;
            let response = request.json(&body).send().await?;

            if !response.status().is_success() {
                return Err(status_error(response).await);
            }

            let message_id = response
                .json::<PublishResponse>()
                .await?
                .message_ids
                .into_iter()
                .next()
                .ok_or(BusError::MissingMessageId)?;

            self.published.fetch_add(1, Ordering::Relaxed);
            Ok(message_id)
        }
    }

    fn close(&self) -> impl Future<Output = BusResult<()>> + Send {
        async move {
            if self.closed.swap(true, Ordering::AcqRel) {
                return Err(BusError::Closed);
            }
            tracing::debug!(
                "Closed topic {} after {} acknowledged messages",
                self.name,
                self.published()
            );
            Ok(())
        }
    }
}

async fn status_error(response: Response) -> BusError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    BusError::Status { status, body }
}
