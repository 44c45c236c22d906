//! Catalog module: loading the provider catalog and extracting crawl targets
//!
//! - `loader`: fetches and decodes the YAML catalog
//! - `extract`: turns the decoded catalog into an ordered list of URLs
//! - `types`: catalog records, crawl targets, and the wire payload

mod extract;
mod loader;
mod types;

pub use extract::extract_targets;
pub use loader::{build_http_client, load_catalog, parse_catalog};
pub use types::{Catalog, CrawlRequest, CrawlTarget, ServiceRecord};
