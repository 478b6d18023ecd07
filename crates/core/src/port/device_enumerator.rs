// Device Enumerator Port
use async_trait::async_trait;

use super::probe_error::ProbeError;
use crate::domain::DeviceSnapshot;

/// Lists currently attached USB devices
#[async_trait]
pub trait DeviceEnumerator: Send + Sync {
    /// Snapshot of attached devices.
    ///
    /// # Errors
    /// ProbeError::Enumeration when the device list could not be read. An empty
    /// snapshot means no devices, never a failure.
    async fn enumerate(&self) -> Result<DeviceSnapshot, ProbeError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock enumerator returning whatever snapshot was last set
    #[derive(Clone)]
    pub struct MockDeviceEnumerator {
        next: Arc<Mutex<Result<DeviceSnapshot, ProbeError>>>,
        calls: Arc<Mutex<usize>>,
    }

    impl MockDeviceEnumerator {
        pub fn new(snapshot: DeviceSnapshot) -> Self {
            Self {
                next: Arc::new(Mutex::new(Ok(snapshot))),
                calls: Arc::new(Mutex::new(0)),
            }
        }

        pub fn set_snapshot(&self, snapshot: DeviceSnapshot) {
            *self.next.lock().unwrap() = Ok(snapshot);
        }

        pub fn set_failure(&self, message: impl Into<String>) {
            *self.next.lock().unwrap() = Err(ProbeError::Enumeration(message.into()));
        }

        pub fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl DeviceEnumerator for MockDeviceEnumerator {
        async fn enumerate(&self) -> Result<DeviceSnapshot, ProbeError> {
            *self.calls.lock().unwrap() += 1;
            self.next.lock().unwrap().clone()
        }
    }
}
