//! Auto-discovery of a site's API root and route map.
//!
//! A WordPress site advertises its API root in a `Link` header:
//!
//! ```text
//! Link: <http://example.com/wp-json/>; rel="https://api.w.org/"
//! ```
//!
//! The root serves an index whose `routes` key is a [`RouteMap`].

use serde::Deserialize;
use tracing::{info, instrument, warn};
use url::Url;

use crate::client::WpApi;
use crate::error::{ClientError, DiscoveryError, WpApiError};
use crate::route::RouteMap;
use crate::transport::http::http_client;

/// Link relation identifying the REST API root.
pub const API_LINK_REL: &str = "https://api.w.org/";

/// The parts of an API index this crate reads.
#[derive(Debug, Deserialize)]
struct ApiIndex {
    #[serde(default)]
    routes: RouteMap,
}

/// Discovers the API of the site at `url` and returns a client bootstrapped
/// with its routes.
///
/// ## Errors
///
/// - [`ClientError`] when a request fails or returns a non-success status
/// - [`DiscoveryError::NoApiLink`] when the site advertises no API root
/// - [`DiscoveryError::InvalidIndex`] when the root does not serve a route index
#[instrument(name = "wpapi_discover")]
pub async fn discover(url: &str) -> Result<WpApi, WpApiError> {
    let site = parse_url(url)?;
    let response = fetch(site.clone()).await?;

    let link = response
        .headers()
        .get_all(reqwest::header::LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(find_api_link)
        .ok_or_else(|| {
            warn!(url, "No API link advertised");
            DiscoveryError::NoApiLink { url: url.to_string() }
        })?;

    let api_root = site
        .join(&link)
        .map_err(|source| DiscoveryError::InvalidApiRoot {
            link: link.clone(),
            source,
        })?;
    info!(api_root = %api_root, "Found API root");

    let body = fetch(api_root.clone())
        .await?
        .text()
        .await
        .map_err(ClientError::Request)?;
    let index: ApiIndex = serde_json::from_str(&body).map_err(|source| DiscoveryError::InvalidIndex {
        url: api_root.to_string(),
        source,
    })?;
    info!(routes = index.routes.len(), "Fetched API index");

    WpApi::site(api_root.as_str(), Some(index.routes))
}

fn parse_url(url: &str) -> Result<Url, ClientError> {
    Url::parse(url).map_err(|source| ClientError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

async fn fetch(url: Url) -> Result<reqwest::Response, ClientError> {
    let response = http_client()?.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        return Err(ClientError::HttpStatus {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

/// Extracts the API root from one `Link` header value, which may list
/// several comma-separated links.
fn find_api_link(header: &str) -> Option<String> {
    header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim();
        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        parts
            .filter_map(|param| param.trim().strip_prefix("rel="))
            .any(|rel| rel.trim_matches('"') == API_LINK_REL)
            .then(|| target.to_string())
    })
}
