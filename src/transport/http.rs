//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;

use super::{BodyEncoding, RequestBody, Transport, TransportError, TransportResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default transport built on a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    ?timeout,
                    "HTTP client build failed; using defaults without timeout"
                );
                reqwest::Client::default()
            }
        };
        Self { client }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        body: &RequestBody,
        encoding: BodyEncoding,
    ) -> Result<TransportResponse, TransportError> {
        let request = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, encoding.content_type());
        let request = match encoding {
            BodyEncoding::Json => request.json(&body.to_json()),
            BodyEncoding::Form => request.form(body.fields()),
        };

        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let raw = resp.text().await?;
        tracing::debug!(url, status, bytes = raw.len(), "OAuth endpoint responded");

        let data: Value =
            serde_json::from_str(&raw).map_err(|e| TransportError::InvalidBody {
                status,
                message: e.to_string(),
            })?;
        Ok(TransportResponse { status, data })
    }
}
