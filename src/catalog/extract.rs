use crate::catalog::types::{Catalog, CrawlTarget, ServiceRecord};

/// Flattens the catalog into the ordered list of URLs to crawl
///
/// Services are visited in catalog order. Each contributes its OpenID
/// configuration URL, then its JWKS URI, skipping absent or empty fields.
/// Duplicate URLs across services are kept.
pub fn extract_targets(catalog: &Catalog) -> Vec<CrawlTarget> {
    catalog.services.iter().flat_map(service_targets).collect()
}

fn service_targets(service: &ServiceRecord) -> impl Iterator<Item = CrawlTarget> + '_ {
    [&service.openid_configuration, &service.jwks_uri]
        .into_iter()
        .filter_map(|field| field.as_deref().and_then(CrawlTarget::new))
}
