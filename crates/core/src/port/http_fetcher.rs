// HTTP Fetcher Port
use async_trait::async_trait;

use super::probe_error::ProbeError;

/// Fully drained GET response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Response was delivered over TLS
    pub is_https: bool,
    pub body: String,
}

#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Perform a GET and read the whole body.
    ///
    /// # Errors
    /// ProbeError::Transport when no response could be obtained
    async fn get(&self, url: &str) -> Result<HttpResponse, ProbeError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Mock fetcher replaying queued results; repeats the last one when drained
    #[derive(Clone)]
    pub struct MockHttpFetcher {
        queue: Arc<Mutex<VecDeque<Result<HttpResponse, ProbeError>>>>,
        last: Arc<Mutex<Result<HttpResponse, ProbeError>>>,
        calls: Arc<Mutex<usize>>,
    }

    impl MockHttpFetcher {
        pub fn new(results: Vec<Result<HttpResponse, ProbeError>>) -> Self {
            let last = results
                .last()
                .cloned()
                .unwrap_or_else(|| Err(ProbeError::Transport("no response scripted".to_string())));
            Self {
                queue: Arc::new(Mutex::new(results.into())),
                last: Arc::new(Mutex::new(last)),
                calls: Arc::new(Mutex::new(0)),
            }
        }

        pub fn responding(status: u16, is_https: bool, body: impl Into<String>) -> Self {
            Self::new(vec![Ok(HttpResponse {
                status,
                is_https,
                body: body.into(),
            })])
        }

        pub fn unreachable() -> Self {
            Self::new(vec![Err(ProbeError::Transport("connection refused".to_string()))])
        }

        pub fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl HttpFetcher for MockHttpFetcher {
        async fn get(&self, _url: &str) -> Result<HttpResponse, ProbeError> {
            *self.calls.lock().unwrap() += 1;
            let next = self.queue.lock().unwrap().pop_front();
            next.unwrap_or_else(|| self.last.lock().unwrap().clone())
        }
    }
}
