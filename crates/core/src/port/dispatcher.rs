// Dispatcher Port
//
// The seam between detectors and the execution gate.

use async_trait::async_trait;

use crate::domain::{Dispatch, ScopeId, TriggerSource};

#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Run the commands eligible for `source` and `scope_id`.
    ///
    /// Never fails: every problem is folded into the returned outcome.
    async fn dispatch(&self, source: TriggerSource, scope_id: ScopeId, suppress: bool) -> Dispatch;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::ExecOutcome;
    use std::sync::{Arc, Mutex};

    /// Records every dispatch request and reports success
    #[derive(Clone, Default)]
    pub struct RecordingDispatcher {
        calls: Arc<Mutex<Vec<(TriggerSource, ScopeId, bool)>>>,
    }

    impl RecordingDispatcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<(TriggerSource, ScopeId, bool)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Dispatcher for RecordingDispatcher {
        async fn dispatch(&self, source: TriggerSource, scope_id: ScopeId, suppress: bool) -> Dispatch {
            self.calls.lock().unwrap().push((source, scope_id, suppress));
            if suppress {
                return Dispatch::skipped(ExecOutcome::NotExecuted);
            }
            Dispatch {
                outcome: ExecOutcome::Success,
                late_ran: false,
            }
        }
    }
}
