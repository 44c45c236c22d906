//! Message bus module
//!
//! This module contains everything that talks to the publish/subscribe
//! transport:
//! - The `MessageBus` / `TopicHandle` traits the publisher is written against
//! - A Google Cloud Pub/Sub implementation over the REST API
//! - Access token handling for that implementation

mod auth;
mod pubsub;
mod traits;

pub use auth::{Credentials, TokenProvider, DEFAULT_METADATA_HOST};
pub use pubsub::{PubSubBus, PubSubTopic, DEFAULT_ENDPOINT};
pub use traits::{MessageBus, MessageId, TopicHandle, TopicPath};
