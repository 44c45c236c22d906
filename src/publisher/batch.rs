//! Fan-out of crawl targets onto a topic
//!
//! One topic handle serves the whole batch. Each target is serialized and
//! published on its own, so a failure only ever affects that target's slot in
//! the report. A semaphore bounds how many publishes await acknowledgment at
//! once; with the default of one, each target waits for the previous
//! acknowledgment before it is submitted.

use crate::bus::{MessageBus, MessageId, TopicHandle, TopicPath};
use crate::catalog::{CrawlRequest, CrawlTarget};
use crate::publisher::abort::AbortSignal;
use crate::publisher::report::{Outcome, PublishReport, TargetOutcome};
use crate::{BusError, BusResult, TargetError};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Publishes batches of crawl targets
#[derive(Debug, Clone)]
pub struct Publisher {
    max_in_flight: usize,
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Publisher {
    /// Creates a publisher allowing up to `max_in_flight` unacknowledged publishes
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Publishes one crawl request per target
    ///
    /// # Returns
    ///
    /// * `Ok(PublishReport)` - One outcome per target, in target order
    /// * `Err(BusError)` - The topic could not be opened; nothing was published
    ///
    /// The topic handle is closed exactly once after every submitted publish
    /// has completed, whatever the individual outcomes were.
    pub async fn publish<B: MessageBus>(
        &self,
        bus: &B,
        topic: &TopicPath,
        targets: Vec<CrawlTarget>,
        abort: &AbortSignal,
    ) -> BusResult<PublishReport> {
        let started_at = Utc::now();

        let handle = Arc::new(bus.open(topic).await?);
        tracing::info!(
            "Publishing {} crawl requests to {} ({} in flight)",
            targets.len(),
            topic,
            self.max_in_flight
        );

        let results = self.publish_all(&handle, &targets, abort).await;

        if let Err(e) = handle.close().await {
            tracing::warn!("Failed to close topic {}: {}", topic, e);
        }

        let outcomes = targets
            .into_iter()
            .zip(results)
            .map(|(target, outcome)| TargetOutcome { target, outcome })
            .collect();

        Ok(PublishReport {
            outcomes,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn publish_all<H: TopicHandle>(
        &self,
        handle: &Arc<H>,
        targets: &[CrawlTarget],
        abort: &AbortSignal,
    ) -> Vec<Outcome> {
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut abort = abort.clone();
        let mut tasks: JoinSet<(usize, BusResult<MessageId>)> = JoinSet::new();

        let mut slots: Vec<Option<Outcome>> = targets.iter().map(|_| None).collect();
        let mut submitted = vec![false; targets.len()];

        for (index, target) in targets.iter().enumerate() {
            if abort.is_aborted() {
                tracing::warn!(
                    "Abort requested; not submitting the remaining {} crawl requests",
                    targets.len() - index
                );
                break;
            }

            let payload = match CrawlRequest::for_target(target).to_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!("Skipping {} due to serialization error: {}", target, e);
                    slots[index] = Some(Outcome::Failed(TargetError::Serialize(e)));
                    continue;
                }
            };

            let permit = tokio::select! {
                biased;
                _ = abort.aborted() => {
                    tracing::warn!("Abort requested while waiting to publish {}", target);
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            tracing::debug!("Submitting crawl request for {}", target);
            submitted[index] = true;

            let handle = Arc::clone(handle);
            tasks.spawn(async move {
                let result = handle.publish(payload).await;
                drop(permit);
                (index, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(message_id))) => {
                    tracing::info!(
                        "Published crawl request for {} with message ID: {}",
                        targets[index],
                        message_id
                    );
                    slots[index] = Some(Outcome::Published { message_id });
                }
                Ok((index, Err(e))) => {
                    tracing::error!(
                        "Failed to publish crawl request for {}: {}",
                        targets[index],
                        e
                    );
                    slots[index] = Some(Outcome::Failed(TargetError::Publish(e)));
                }
                Err(e) => {
                    tracing::error!("Publish task failed: {}", e);
                }
            }
        }

        slots
            .into_iter()
            .zip(submitted)
            .map(|(slot, was_submitted)| match slot {
                Some(outcome) => outcome,
                // The task died before reporting back
                None if was_submitted => Outcome::Failed(TargetError::Publish(BusError::Task(
                    "publish task panicked or was cancelled".to_string(),
                ))),
                None => Outcome::Skipped,
            })
            .collect()
    }
}
