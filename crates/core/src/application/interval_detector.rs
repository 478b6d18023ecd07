//! Interval Detector - recurring triggers inside an optional time window
//!
//! One long-lived task per target. The task ends at `stop_at` or on shutdown.

use std::sync::Arc;
use tracing::{debug, info};

use super::shutdown::ShutdownToken;
use crate::domain::{IntervalTarget, TriggerSource};
use crate::port::{Dispatcher, TimeProvider};

pub struct IntervalDetector {
    clock: Arc<dyn TimeProvider>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl IntervalDetector {
    pub fn new(clock: Arc<dyn TimeProvider>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { clock, dispatcher }
    }

    fn stopped(&self, target: &IntervalTarget) -> bool {
        target.stop.is_some_and(|stop| self.clock.now() >= stop)
    }

    /// Drive one target until its window closes or shutdown is signalled.
    ///
    /// Returns the number of dispatches raised.
    pub async fn run(&self, target: &IntervalTarget, suppress: bool, mut shutdown: ShutdownToken) -> usize {
        if target.interval.is_zero() {
            return 0;
        }

        if let Some(start) = target.start {
            if let Ok(wait) = (start - self.clock.now()).to_std() {
                debug!(start = %start, wait_ms = wait.as_millis() as u64, "Waiting for interval start");
                if !shutdown.sleep(wait).await {
                    return 0;
                }
            }
        }

        if self.stopped(target) {
            info!(scope_id = target.scope_id, "Interval window already closed");
            return 0;
        }

        let mut dispatched = 0;
        if target.execute_on_start {
            info!(scope_id = target.scope_id, "Executing on interval start");
            self.dispatcher
                .dispatch(TriggerSource::Interval, target.scope_id, suppress)
                .await;
            dispatched += 1;
        }

        while shutdown.sleep(target.interval).await {
            if self.stopped(target) {
                info!(scope_id = target.scope_id, dispatched, "Interval window closed");
                break;
            }
            info!(scope_id = target.scope_id, "Executing on interval tracking");
            self.dispatcher
                .dispatch(TriggerSource::Interval, target.scope_id, suppress)
                .await;
            dispatched += 1;
        }

        dispatched
    }
}
