//! Ping Detector - bounded retry loop of single ICMP echo attempts per target
//!
//! Policy `on_success = true` dispatches on the first reply; otherwise a
//! dispatch happens only when every attempt stayed unanswered.

use futures::future::join_all;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::domain::{PingOutcome, PingTarget, TriggerSource};
use crate::port::{Dispatcher, IcmpProber};

pub struct PingDetector {
    prober: Arc<dyn IcmpProber>,
    dispatcher: Arc<dyn Dispatcher>,
    targets: Vec<PingTarget>,
    /// Promote precondition and transport errors to a dispatch
    exec_on_error: bool,
}

impl PingDetector {
    pub fn new(
        prober: Arc<dyn IcmpProber>,
        dispatcher: Arc<dyn Dispatcher>,
        targets: Vec<PingTarget>,
        exec_on_error: bool,
    ) -> Self {
        Self {
            prober,
            dispatcher,
            targets,
            exec_on_error,
        }
    }

    /// Probe every configured target concurrently
    pub async fn track(&self, suppress: bool, debug: bool) -> Vec<PingOutcome> {
        join_all(
            self.targets
                .iter()
                .map(|target| self.probe(target, suppress, debug)),
        )
        .await
    }

    /// Run the retry loop for one target
    pub async fn probe(&self, target: &PingTarget, suppress: bool, debug: bool) -> PingOutcome {
        let addr = match self.prober.resolve(&target.target).await {
            Ok(addr) => addr,
            Err(e) => {
                error!(target = %target.target, error = %e, "Ping target could not be prepared");
                return self.on_error(target, suppress, PingOutcome::TransportError).await;
            }
        };

        if target.ping_timeout.is_zero() {
            error!(target = %target.target, "Ping timeout must be greater than zero");
            return self.on_error(target, suppress, PingOutcome::InvalidTimeout).await;
        }

        let attempts = target.retry_count.saturating_add(1);
        for attempt in 0..attempts {
            if debug && attempt > 0 {
                debug!(target = %target.target, attempt, "Retrying ping");
            }

            let success = match self.prober.echo(addr, target.ping_timeout).await {
                Ok(stats) => stats.replied(),
                Err(e) => {
                    error!(target = %target.target, error = %e, "Ping transport error");
                    return self.on_error(target, suppress, PingOutcome::TransportError).await;
                }
            };

            if success {
                if target.on_success {
                    info!(target = %target.target, "Ping successful, executing due to on_success");
                    self.dispatcher
                        .dispatch(TriggerSource::Ping, target.scope_id, suppress)
                        .await;
                    return PingOutcome::ExecutedOnPolicy;
                }
                if debug {
                    debug!(target = %target.target, "Ping successful");
                }
                return PingOutcome::Success;
            }

            if debug {
                debug!(target = %target.target, attempt, "Ping failed");
            }
            if attempt + 1 < attempts {
                sleep(target.retry_delay).await;
            }
        }

        if target.on_success {
            if debug {
                debug!(target = %target.target, attempts, "No reply, nothing executed");
            }
            return PingOutcome::NoSuccess;
        }

        info!(target = %target.target, attempts, "Ping failed on every attempt, executing");
        self.dispatcher
            .dispatch(TriggerSource::Ping, target.scope_id, suppress)
            .await;
        PingOutcome::ExecutedOnPolicy
    }

    async fn on_error(&self, target: &PingTarget, suppress: bool, outcome: PingOutcome) -> PingOutcome {
        if !self.exec_on_error {
            return outcome;
        }
        info!(target = %target.target, outcome = ?outcome, "Executing due to execution_on_error");
        self.dispatcher
            .dispatch(TriggerSource::Ping, target.scope_id, suppress)
            .await;
        PingOutcome::ExecutedOnPolicy
    }
}
