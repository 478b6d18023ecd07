// HTTP GET adapter
// reason: reqwest with rustls, so TLS does not depend on the host's OpenSSL
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use tripwire_core::port::{HttpFetcher, HttpResponse, ProbeError};

/// Per-request deadline when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Build a client with a per-request timeout.
    ///
    /// Redirects are followed; the TLS flag reflects the final URL.
    pub fn new(request_timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("tripwire/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProbeError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse, ProbeError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_builder() {
                ProbeError::InvalidTarget {
                    target: url.to_string(),
                    reason: e.to_string(),
                }
            } else if e.is_timeout() {
                ProbeError::Transport(format!("request timed out: {e}"))
            } else {
                ProbeError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let is_https = response.url().scheme() == "https";
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to read response body");
                String::new()
            }
        };

        Ok(HttpResponse {
            status,
            is_https,
            body,
        })
    }
}
