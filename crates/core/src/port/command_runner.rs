// Command Runner Port
// Abstraction for running the configured external commands

use async_trait::async_trait;
use thiserror::Error;

/// Captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    /// stdout followed by stderr
    pub combined: String,
    pub duration_ms: i64,
}

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process exited with status {code:?}")]
    NonZeroExit {
        code: Option<i32>,
        output: CommandOutput,
    },

    #[error("Empty program name")]
    EmptyProgram,

    #[error("IO error: {0}")]
    IoError(String),
}

impl ExecutionError {
    /// Output captured before the failure, if the process ran at all
    pub fn output(&self) -> Option<&CommandOutput> {
        match self {
            ExecutionError::NonZeroExit { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Command Runner trait
///
/// Implementations:
/// - SubprocessRunner: spawns an unsupervised child process and waits for it
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and wait for completion
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the program cannot be started
    /// - ExecutionError::NonZeroExit if it exits unsuccessfully
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// Mock runner: records every invocation, fails for configured programs
    #[derive(Clone, Default)]
    pub struct MockCommandRunner {
        failing: Arc<Mutex<HashSet<String>>>,
        calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    }

    impl MockCommandRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every run of `program` end with a non-zero exit
        pub fn fail_on(self, program: impl Into<String>) -> Self {
            self.failing.lock().unwrap().insert(program.into());
            self
        }

        pub fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }

        /// Program names in invocation order
        pub fn programs(&self) -> Vec<String> {
            self.calls().into_iter().map(|(p, _)| p).collect()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CommandRunner for MockCommandRunner {
        async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecutionError> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec()));

            if self.failing.lock().unwrap().contains(program) {
                return Err(ExecutionError::NonZeroExit {
                    code: Some(1),
                    output: CommandOutput {
                        exit_code: Some(1),
                        combined: "mock failure".to_string(),
                        duration_ms: 1,
                    },
                });
            }
            Ok(CommandOutput {
                exit_code: Some(0),
                combined: String::new(),
                duration_ms: 1,
            })
        }
    }
}
