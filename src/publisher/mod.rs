//! Publisher module: fans crawl targets out onto the message bus
//!
//! - `batch`: the publisher itself, with per-target failure isolation
//! - `report`: the per-target outcome record returned for each batch
//! - `abort`: the signal that stops a batch from issuing new publishes

mod abort;
mod batch;
mod report;

pub use abort::{abort_pair, AbortHandle, AbortSignal};
pub use batch::Publisher;
pub use report::{Outcome, PublishReport, TargetOutcome};
