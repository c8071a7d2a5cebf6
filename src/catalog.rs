//! Source registry catalog
//!
//! Lists repositories through the Docker Registry HTTP API V2 `/v2/_catalog`
//! endpoint.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::EndpointConfig;
use crate::error::CatalogError;

/// Body of a `/v2/_catalog` response
#[derive(Debug, Deserialize)]
struct CatalogResponse {
    repositories: Vec<String>,
}

/// HTTP client for catalog queries
pub struct CatalogClient {
    http: Client,
}

impl CatalogClient {
    /// Create a client whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CatalogError::Client)?;
        Ok(Self { http })
    }

    /// List every repository of `endpoint`, in registry order
    pub async fn list_repositories(
        &self,
        endpoint: &EndpointConfig,
    ) -> Result<Vec<String>, CatalogError> {
        let url = catalog_url(endpoint);
        debug!("Querying catalog: {}", url);

        let mut request = self.http.get(&url);
        if let Some(user) = endpoint.user.as_deref() {
            request = request.basic_auth(user, endpoint.pass.as_deref());
        }

        let response = request.send().await.map_err(|source| CatalogError::Fetch {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CatalogError::Http { url, status });
        }

        let body = response.bytes().await.map_err(|source| CatalogError::Fetch {
            url: url.clone(),
            source,
        })?;

        let catalog: CatalogResponse =
            serde_json::from_slice(&body).map_err(|source| CatalogError::Decode { url, source })?;

        Ok(catalog.repositories)
    }
}

/// Catalog URL for an endpoint
///
/// Plain HTTP is used for insecure registries, and the `api` host replaces the
/// registry host when configured.
pub fn catalog_url(endpoint: &EndpointConfig) -> String {
    let scheme = if endpoint.is_insecure() { "http" } else { "https" };
    format!("{}://{}/v2/_catalog", scheme, endpoint.api_host())
}
