//! HTTP client for the Resource Authority
//!
//! Calls `POST {base_url}/dataset/find-by-ids` with the candidate ids in the
//! body and the scope filters as query parameters. The response lists the
//! resources the authority confirms:
//!
//! ```json
//! { "data": [ { "id": "dataset-1" }, { "id": "dataset-3" } ] }
//! ```

use super::traits::{AuthorityScope, ResourceAuthority};
use crate::error::{Error, Result, Upstream};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP-based authority client.
///
/// Thread-safe and cheaply cloneable (shares the reqwest client internally).
#[derive(Clone)]
pub struct AuthorityClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct FindByIdsRequest<'a> {
    ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct FindByIdsResponse {
    #[serde(default)]
    data: Vec<AuthorityResource>,
}

#[derive(Debug, Deserialize)]
struct AuthorityResource {
    id: String,
}

impl AuthorityClient {
    /// Create a client for the authority rooted at `base_url`.
    ///
    /// `timeout` bounds each request end to end.
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::authority(format!("failed to build HTTP client: {}", e)))?;

        let url = format!("{}/dataset/find-by-ids", base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            url,
            api_key,
            timeout,
        })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                service: Upstream::ResourceAuthority,
                after: self.timeout,
            }
        } else {
            Error::from(e)
        }
    }
}

#[async_trait]
impl ResourceAuthority for AuthorityClient {
    async fn filter_ids(&self, ids: &[String], scope: &AuthorityScope) -> Result<Vec<String>> {
        tracing::debug!(candidates = ids.len(), ?scope, "Checking ids against resource authority");

        let mut request = self
            .client
            .post(&self.url)
            .query(&scope.pairs())
            .json(&FindByIdsRequest { ids });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Resource authority rejected find-by-ids");
            return Err(Error::authority(format!("HTTP {}: {}", status, body)));
        }

        let parsed: FindByIdsResponse = response
            .json()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        Ok(parsed.data.into_iter().map(|r| r.id).collect())
    }
}
