//! JWKS Catalog Crawler main entry point
//!
//! This is the command-line interface that turns the provider catalog into
//! Pub/Sub crawl requests.

use clap::Parser;
use jwks_catalog_crawler::bus::PubSubBus;
use jwks_catalog_crawler::catalog::build_http_client;
use jwks_catalog_crawler::config::{load_config_with_hash, Config};
use jwks_catalog_crawler::pipeline::{exit_code, plan, run, EXIT_FAILURE};
use jwks_catalog_crawler::publisher::abort_pair;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// JWKS Catalog Crawler: publishes one crawl request per catalog URL
///
/// Required settings come from the environment (YAML_CATALOG_URL,
/// GCP_PROJECT_ID, PUBSUB_TOPIC_NAME) or from an optional TOML file.
#[derive(Parser, Debug)]
#[command(name = "jwks-catalog-crawler")]
#[command(version)]
#[command(about = "Publishes crawl requests for every URL in a JWKS catalog", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Load the catalog and list the URLs without publishing anything
    #[arg(long)]
    dry_run: bool,

    /// Exit non-zero if any crawl request fails to publish
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("JWKS Catalog Crawler version: {}", crawler_version());

    let mut config = match load_config_with_hash(cli.config.as_deref()) {
        Ok((cfg, Some(hash))) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Ok((cfg, None)) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    if cli.strict {
        config.run.strict = true;
    }

    let client = match build_http_client(&config.http) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &client).await
    } else {
        handle_publish(config, client).await
    }
}

/// The build system may inject CRAWLER_VERSION; fall back to the crate version
fn crawler_version() -> &'static str {
    match option_env!("CRAWLER_VERSION") {
        Some(version) if !version.is_empty() => version,
        _ => env!("CARGO_PKG_VERSION"),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("jwks_catalog_crawler=info,warn"),
            1 => EnvFilter::new("jwks_catalog_crawler=debug,info"),
            2 => EnvFilter::new("jwks_catalog_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: shows what would be published
async fn handle_dry_run(config: &Config, client: &reqwest::Client) -> ExitCode {
    match plan(config, client).await {
        Ok((services, targets)) => {
            println!("=== JWKS Catalog Crawler Dry Run ===\n");
            println!("Catalog: {}", config.catalog.url);
            println!(
                "Topic: projects/{}/topics/{}",
                config.pubsub.project_id, config.pubsub.topic
            );
            println!("Services: {}", services);
            println!("\nCrawl requests ({}):", targets.len());
            for target in &targets {
                println!("  - {}", target);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Failed to load catalog: {}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Handles the main publish run
async fn handle_publish(config: Config, client: reqwest::Client) -> ExitCode {
    let bus = PubSubBus::from_config(client.clone(), &config.pubsub);

    let (abort_handle, abort) = abort_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight publishes");
            abort_handle.abort();
        }
    });

    let result = run(&config, &client, &bus, &abort).await;
    match &result {
        Ok(summary) => tracing::info!(
            "Run completed: {} services, {} of {} crawl requests published",
            summary.services,
            summary.report.succeeded(),
            summary.report.total()
        ),
        Err(e) => tracing::error!("Run failed: {}", e),
    }

    exit_code(&result)
}
