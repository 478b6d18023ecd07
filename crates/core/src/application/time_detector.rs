//! Time Detector - one-shot triggers at configured timestamps

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{TimeOutcome, TimeTarget, TriggerSource};
use crate::port::{Dispatcher, TimeProvider};

pub struct TimeDetector {
    clock: Arc<dyn TimeProvider>,
    dispatcher: Arc<dyn Dispatcher>,
    targets: Vec<TimeTarget>,
    /// Parallel to `targets`; set once a timestamp fired or was missed
    fired: Mutex<Vec<bool>>,
}

impl TimeDetector {
    pub fn new(clock: Arc<dyn TimeProvider>, dispatcher: Arc<dyn Dispatcher>, targets: Vec<TimeTarget>) -> Self {
        let fired = Mutex::new(vec![false; targets.len()]);
        Self {
            clock,
            dispatcher,
            targets,
            fired,
        }
    }

    /// Evaluate every target against the current time
    pub async fn check(&self, suppress: bool) -> Vec<TimeOutcome> {
        let mut fired = self.fired.lock().await;
        let now = self.clock.now();
        let mut outcomes = Vec::with_capacity(self.targets.len());

        for (index, target) in self.targets.iter().enumerate() {
            if fired[index] {
                outcomes.push(TimeOutcome::AlreadyFired);
                continue;
            }
            if now < target.timestamp {
                outcomes.push(TimeOutcome::Pending);
                continue;
            }

            fired[index] = true;
            match (now - target.timestamp).to_std() {
                Ok(late) if late <= target.tolerance => {
                    info!(timestamp = %target.timestamp, "Executing on time tracking");
                    if !late.is_zero() {
                        debug!(timestamp = %target.timestamp, late_ms = late.as_millis() as u64, "Time trigger fired late");
                    }
                    self.dispatcher
                        .dispatch(TriggerSource::Time, target.scope_id, suppress)
                        .await;
                    outcomes.push(TimeOutcome::Fired);
                }
                _ => {
                    warn!(
                        timestamp = %target.timestamp,
                        now = %now,
                        "Timestamp passed outside its tolerance window, not executing"
                    );
                    outcomes.push(TimeOutcome::Missed);
                }
            }
        }

        outcomes
    }
}
