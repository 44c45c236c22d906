//! Message bus traits and addressing types
//!
//! The publisher only talks to the bus through these traits, so the batch
//! logic can be exercised against an in-memory bus in tests.

use crate::BusResult;
use std::fmt;
use std::future::Future;

/// Identifier the bus assigns to an accepted message
pub type MessageId = String;

/// Fully qualified topic address: `projects/{project}/topics/{topic}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPath {
    pub project: String,
    pub topic: String,
}

impl TopicPath {
    pub fn new(project: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            topic: topic.into(),
        }
    }
}

impl fmt::Display for TopicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projects/{}/topics/{}", self.project, self.topic)
    }
}

/// A message bus that can resolve topics
pub trait MessageBus {
    type Handle: TopicHandle;

    /// Connects to the bus and resolves `topic`
    ///
    /// Failing here is a setup failure: nothing has been published yet.
    fn open(&self, topic: &TopicPath) -> impl Future<Output = BusResult<Self::Handle>> + Send;
}

/// An open, resolved topic
///
/// Handles are shared across publish tasks, so they must be `Send + Sync`.
pub trait TopicHandle: Send + Sync + 'static {
    /// Submits one message and waits for the bus to assign it an id
    fn publish(&self, payload: Vec<u8>) -> impl Future<Output = BusResult<MessageId>> + Send;

    /// Releases the handle
    ///
    /// Called exactly once per batch, after every publish has completed.
    fn close(&self) -> impl Future<Output = BusResult<()>> + Send;
}
