// Lock File Port
//
// Presence of a marker file gates command execution.

use std::io;

pub trait LockFile: Send + Sync {
    /// Whether the lock file currently exists
    fn is_present(&self) -> io::Result<bool>;

    /// Create an empty lock file if missing
    fn create(&self) -> io::Result<()>;

    /// Remove the lock file if present
    fn remove(&self) -> io::Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory lock file
    #[derive(Clone, Default)]
    pub struct MockLockFile {
        present: Arc<Mutex<bool>>,
        broken: bool,
    }

    impl MockLockFile {
        pub fn new(present: bool) -> Self {
            Self {
                present: Arc::new(Mutex::new(present)),
                broken: false,
            }
        }

        /// Every filesystem call fails
        pub fn broken() -> Self {
            Self {
                broken: true,
                ..Self::default()
            }
        }

        pub fn present(&self) -> bool {
            *self.present.lock().unwrap()
        }

        fn check(&self) -> io::Result<()> {
            if self.broken {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "mock broken fs"));
            }
            Ok(())
        }
    }

    impl LockFile for MockLockFile {
        fn is_present(&self) -> io::Result<bool> {
            self.check()?;
            Ok(self.present())
        }

        fn create(&self) -> io::Result<()> {
            self.check()?;
            *self.present.lock().unwrap() = true;
            Ok(())
        }

        fn remove(&self) -> io::Result<()> {
            self.check()?;
            *self.present.lock().unwrap() = false;
            Ok(())
        }
    }
}
