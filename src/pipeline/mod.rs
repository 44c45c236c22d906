//! Pipeline module: catalog → targets → topic
//!
//! This is the main entry point for a crawl-request run. It will:
//! 1. Fetch and decode the catalog
//! 2. Extract the crawl targets
//! 3. Publish one crawl request per target
//! 4. Judge the batch with the configured partial-failure policy
//!
//! Catalog and topic setup failures end the run immediately; individual
//! publish failures are logged and left to the policy.

mod policy;

pub use policy::{
    exit_code, exit_status, PartialFailurePolicy, EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_SUCCESS,
};

use crate::bus::{MessageBus, TopicPath};
use crate::catalog::{extract_targets, load_catalog, CrawlTarget};
use crate::config::Config;
use crate::publisher::{AbortSignal, PublishReport, Publisher};
use crate::CrawlerError;
use reqwest::Client;

/// What a completed run did
#[derive(Debug)]
pub struct RunSummary {
    /// Number of services in the catalog
    pub services: usize,
    pub report: PublishReport,
}

/// Runs one complete catalog-to-topic pass
///
/// # Arguments
///
/// * `config` - Validated crawler configuration
/// * `client` - HTTP client used for the catalog fetch
/// * `bus` - Message bus to publish on
/// * `abort` - Stops issuing new publishes once fired
///
/// # Returns
///
/// * `Ok(RunSummary)` - The batch ran and the policy accepted it
/// * `Err(CrawlerError)` - Catalog or topic setup failed, or the policy rejected the batch
pub async fn run<B: MessageBus>(
    config: &Config,
    client: &Client,
    bus: &B,
    abort: &AbortSignal,
) -> Result<RunSummary, CrawlerError> {
    let (services, targets) = plan(config, client).await?;

    let topic = TopicPath::new(&config.pubsub.project_id, &config.pubsub.topic);
    let publisher = Publisher::new(config.pubsub.max_in_flight as usize);

    let report = publisher
        .publish(bus, &topic, targets, abort)
        .await
        .map_err(|source| CrawlerError::BusConnect {
            topic: topic.to_string(),
            source,
        })?;

    log_report(&report);
    PartialFailurePolicy::from_config(&config.run).evaluate(&report)?;

    Ok(RunSummary { services, report })
}

/// Loads the catalog and extracts its targets without publishing anything
///
/// Returns the number of services alongside the targets.
pub async fn plan(
    config: &Config,
    client: &Client,
) -> Result<(usize, Vec<CrawlTarget>), CrawlerError> {
    tracing::info!("Loading catalog from {}", config.catalog.url);
    let catalog = load_catalog(client, &config.catalog.url).await?;

    let targets = extract_targets(&catalog);
    tracing::info!(
        "Catalog lists {} services with {} crawlable URLs",
        catalog.services.len(),
        targets.len()
    );

    Ok((catalog.services.len(), targets))
}

/// Logs the final tally; individual failures were logged as they happened
fn log_report(report: &PublishReport) {
    tracing::info!("{}", tally(report));
}

fn tally(report: &PublishReport) -> String {
    format!(
        "Crawl requests: {} attempted, {} succeeded, {} failed, {} skipped in {}ms",
        report.attempted(),
        report.succeeded(),
        report.failed(),
        report.skipped(),
        report.duration().num_milliseconds()
    )
}
