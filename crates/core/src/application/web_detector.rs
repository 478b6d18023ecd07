//! Web Detector - HTTP GET with retries and a multi-criteria match
//!
//! Criteria are checked in a fixed order (status code, TLS failure, content)
//! and the last one that matches names the outcome.

use futures::future::join_all;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::domain::{TriggerSource, WebOutcome, WebTarget};
use crate::port::{Dispatcher, HttpFetcher};

/// Result of the retrieval step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSnapshot {
    /// `-1` when no attempt connected
    pub status: i32,
    pub is_https: bool,
    pub content: String,
}

impl WebSnapshot {
    pub fn unreachable() -> Self {
        Self {
            status: -1,
            is_https: false,
            content: String::new(),
        }
    }
}

/// Evaluate every enabled criterion; the last match wins
pub fn evaluate(target: &WebTarget, snapshot: &WebSnapshot) -> WebOutcome {
    let mut outcome = WebOutcome::NoTrigger;

    if target.status_code != 0 {
        if target.on_code_identical {
            if snapshot.status == target.status_code {
                outcome = WebOutcome::StatusCodeMatch;
            }
        } else if snapshot.status != target.status_code {
            outcome = WebOutcome::StatusCodeMismatch;
        }
    }

    if target.on_https_fails && !snapshot.is_https {
        outcome = WebOutcome::TlsFailureMatch;
    }

    if !target.content.is_empty() {
        if target.content_is_exact {
            if snapshot.content == target.content {
                outcome = WebOutcome::ContentExactMatch;
            }
        } else if snapshot.content.contains(&target.content) {
            outcome = WebOutcome::ContentSubstringMatch;
        }
    }

    outcome
}

pub struct WebDetector {
    fetcher: Arc<dyn HttpFetcher>,
    dispatcher: Arc<dyn Dispatcher>,
    targets: Vec<WebTarget>,
}

impl WebDetector {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, dispatcher: Arc<dyn Dispatcher>, targets: Vec<WebTarget>) -> Self {
        Self {
            fetcher,
            dispatcher,
            targets,
        }
    }

    /// Probe every configured target concurrently
    pub async fn track(&self, suppress: bool, debug: bool) -> Vec<WebOutcome> {
        join_all(
            self.targets
                .iter()
                .map(|target| self.probe(target, suppress, debug)),
        )
        .await
    }

    pub async fn probe(&self, target: &WebTarget, suppress: bool, debug: bool) -> WebOutcome {
        if debug {
            debug!(target = %target.target, "Web request");
        }
        let snapshot = self.retrieve(target, debug).await;
        let outcome = evaluate(target, &snapshot);

        if outcome != WebOutcome::NoTrigger {
            info!(target = %target.target, outcome = ?outcome, "Executing on web tracking");
            self.dispatcher
                .dispatch(TriggerSource::Web, target.scope_id, suppress)
                .await;
        }
        outcome
    }

    /// Up to `retry_count + 1` GET attempts; the first one that connects wins
    pub async fn retrieve(&self, target: &WebTarget, debug: bool) -> WebSnapshot {
        let attempts = target.retry_count.saturating_add(1);
        for attempt in 0..attempts {
            match self.fetcher.get(&target.target).await {
                Ok(response) => {
                    if debug {
                        debug!(
                            target = %target.target,
                            status = response.status,
                            is_https = response.is_https,
                            content = %response.body,
                            "Web response"
                        );
                    }
                    return WebSnapshot {
                        status: i32::from(response.status),
                        is_https: response.is_https,
                        content: response.body,
                    };
                }
                Err(e) => {
                    warn!(target = %target.target, attempt, error = %e, "Web request failed");
                }
            }
            if attempt + 1 < attempts {
                sleep(target.retry_delay).await;
            }
        }
        WebSnapshot::unreachable()
    }
}
