//! Batch publish report
//!
//! Every target handed to the publisher ends up in exactly one
//! [`TargetOutcome`], whether it was published, failed, or never submitted.

use crate::bus::MessageId;
use crate::catalog::CrawlTarget;
use crate::TargetError;
use chrono::{DateTime, Utc};

/// What happened to a single target
#[derive(Debug)]
pub enum Outcome {
    /// The bus acknowledged the message
    Published { message_id: MessageId },

    /// Serialization or publishing failed
    Failed(TargetError),

    /// Never submitted because the batch was aborted
    Skipped,
}

impl Outcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Outcome::Published { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped)
    }
}

/// A target paired with its outcome
#[derive(Debug)]
pub struct TargetOutcome {
    pub target: CrawlTarget,
    pub outcome: Outcome,
}

/// Result of publishing one batch of targets
#[derive(Debug)]
pub struct PublishReport {
    /// One entry per target, in target order
    pub outcomes: Vec<TargetOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PublishReport {
    /// Number of targets in the batch
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Targets that were submitted (or failed to serialize)
    pub fn attempted(&self) -> usize {
        self.total() - self.skipped()
    }

    pub fn succeeded(&self) -> usize {
        self.count(Outcome::is_published)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(Outcome::is_skipped)
    }

    /// True when the batch stopped early because of an abort
    pub fn was_aborted(&self) -> bool {
        self.skipped() > 0
    }

    /// Failed targets with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&CrawlTarget, &TargetError)> {
        self.outcomes.iter().filter_map(|o| match &o.outcome {
            Outcome::Failed(e) => Some((&o.target, e)),
            _ => None,
        })
    }

    /// Message ids of published targets
    pub fn published(&self) -> impl Iterator<Item = (&CrawlTarget, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.outcome {
            Outcome::Published { message_id } => Some((&o.target, message_id.as_str())),
            _ => None,
        })
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    fn count(&self, pred: fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }
}
