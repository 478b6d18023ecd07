// ICMP Prober Port
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

use super::probe_error::ProbeError;

/// Statistics of one single-packet echo run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PingStatistics {
    pub packets_sent: u32,
    pub packets_recv: u32,
}

impl PingStatistics {
    pub fn replied(&self) -> bool {
        self.packets_recv > 0
    }
}

/// ICMP echo port
#[async_trait]
pub trait IcmpProber: Send + Sync {
    /// Resolve a host name or address literal.
    ///
    /// # Errors
    /// ProbeError::InvalidTarget for malformed or unresolvable targets
    async fn resolve(&self, target: &str) -> Result<IpAddr, ProbeError>;

    /// Send exactly one echo request and wait at most `timeout` for the reply.
    ///
    /// A missing reply is `Ok` with zero packets received.
    ///
    /// # Errors
    /// ProbeError::Transport when the request could not be sent at all
    async fn echo(&self, addr: IpAddr, timeout: Duration) -> Result<PingStatistics, ProbeError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::net::Ipv4Addr;
    use std::sync::{Arc, Mutex};

    /// Scripted reply for one echo attempt
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum EchoScript {
        Reply,
        Silence,
        TransportFailure,
    }

    /// Mock prober replaying a script of attempt results.
    /// Once the script is exhausted the last entry repeats.
    #[derive(Clone)]
    pub struct MockIcmpProber {
        script: Arc<Mutex<VecDeque<EchoScript>>>,
        last: Arc<Mutex<EchoScript>>,
        unresolvable: bool,
        attempts: Arc<Mutex<usize>>,
    }

    impl MockIcmpProber {
        pub fn new(script: Vec<EchoScript>) -> Self {
            let last = script.last().copied().unwrap_or(EchoScript::Silence);
            Self {
                script: Arc::new(Mutex::new(script.into())),
                last: Arc::new(Mutex::new(last)),
                unresolvable: false,
                attempts: Arc::new(Mutex::new(0)),
            }
        }

        pub fn always(reply: EchoScript) -> Self {
            Self::new(vec![reply])
        }

        pub fn unresolvable() -> Self {
            Self {
                unresolvable: true,
                ..Self::always(EchoScript::Silence)
            }
        }

        pub fn attempts(&self) -> usize {
            *self.attempts.lock().unwrap()
        }
    }

    #[async_trait]
    impl IcmpProber for MockIcmpProber {
        async fn resolve(&self, target: &str) -> Result<IpAddr, ProbeError> {
            if self.unresolvable {
                return Err(ProbeError::InvalidTarget {
                    target: target.to_string(),
                    reason: "mock unresolvable".to_string(),
                });
            }
            Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))
        }

        async fn echo(&self, _addr: IpAddr, _timeout: Duration) -> Result<PingStatistics, ProbeError> {
            *self.attempts.lock().unwrap() += 1;
            let step = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(*self.last.lock().unwrap());

            match step {
                EchoScript::Reply => Ok(PingStatistics {
                    packets_sent: 1,
                    packets_recv: 1,
                }),
                EchoScript::Silence => Ok(PingStatistics {
                    packets_sent: 1,
                    packets_recv: 0,
                }),
                EchoScript::TransportFailure => {
                    Err(ProbeError::Transport("mock network unreachable".to_string()))
                }
            }
        }
    }
}
