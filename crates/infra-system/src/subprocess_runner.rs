// Subprocess command runner
// reason: tokio::process so a long-running command never blocks the detectors
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

use tripwire_core::port::{CommandOutput, CommandRunner, ExecutionError, TimeProvider};

/// Runs configured commands as unsupervised child processes
///
/// stdout and stderr are captured and concatenated; the child inherits the
/// daemon's environment and working directory.
pub struct SubprocessRunner {
    time_provider: Arc<dyn TimeProvider>,
}

impl SubprocessRunner {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }

    /// Spawn child process and wait for output
    async fn spawn_and_wait(&self, program: &str, args: &[String]) -> Result<std::process::Output, ExecutionError> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(format!("{program}: {e}")))?;

        child
            .wait_with_output()
            .await
            .map_err(|e| ExecutionError::IoError(e.to_string()))
    }
}

/// stdout followed by stderr, lossily decoded
fn combine(output: &std::process::Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecutionError> {
        if program.trim().is_empty() {
            return Err(ExecutionError::EmptyProgram);
        }

        let start_time = self.time_provider.now_millis();
        let output = self.spawn_and_wait(program, args).await?;
        let duration_ms = self.time_provider.now_millis() - start_time;

        let result = CommandOutput {
            exit_code: output.status.code(),
            combined: combine(&output),
            duration_ms,
        };

        debug!(
            program = %program,
            exit_code = ?result.exit_code,
            duration_ms,
            "Subprocess finished"
        );

        if output.status.success() {
            Ok(result)
        } else {
            Err(ExecutionError::NonZeroExit {
                code: result.exit_code,
                output: result,
            })
        }
    }
}
