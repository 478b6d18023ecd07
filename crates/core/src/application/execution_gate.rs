//! Execution Gate - decides whether and which configured commands run
//!
//! One dispatch:
//! 1. operator override (`suppress`) short-circuits to `NotExecuted`
//! 2. the file lock may block with `SkippedFileLock`
//! 3. eligible immediate commands run in declared order
//! 4. eligible late commands run afterwards, in declared order
//!
//! Per-command results are folded with [`ExecOutcome::fold`].

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::{Command, Dispatch, ExecOutcome, FileLockSettings, ScopeId, TriggerSource};
use crate::port::{CommandRunner, Dispatcher, LockFile};

pub struct ExecutionGate {
    commands: Vec<Command>,
    lock: FileLockSettings,
    lock_file: Arc<dyn LockFile>,
    runner: Arc<dyn CommandRunner>,
}

impl ExecutionGate {
    pub fn new(
        commands: Vec<Command>,
        lock: FileLockSettings,
        lock_file: Arc<dyn LockFile>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            commands,
            lock,
            lock_file,
            runner,
        }
    }

    /// Run every eligible command for `source` and `scope_id`
    pub async fn execute(&self, source: TriggerSource, scope_id: ScopeId, suppress: bool) -> Dispatch {
        if suppress {
            info!(source = %source, scope_id, "Execution aborted due to no-exec override");
            return Dispatch::skipped(ExecOutcome::NotExecuted);
        }

        if self.is_blocked_by_lock() {
            return Dispatch::skipped(ExecOutcome::SkippedFileLock);
        }

        let (immediate, late) = self.partition(source, scope_id);
        debug!(
            source = %source,
            scope_id,
            immediate = immediate.len(),
            late = late.len(),
            "Dispatching commands"
        );

        let mut aggregate = ExecOutcome::NotExecuted;
        for command in immediate {
            aggregate = aggregate.fold(self.run_command(command).await);
        }

        let mut late_ran = false;
        for command in late {
            let result = self.run_command(command).await;
            aggregate = aggregate.fold(result);
            if result == ExecOutcome::Success {
                late_ran = true;
            }
        }

        if late_ran {
            self.lock_housekeeping();
        }

        info!(source = %source, scope_id, outcome = %aggregate, late_ran, "Dispatch finished");
        Dispatch {
            outcome: aggregate,
            late_ran,
        }
    }

    /// Split the eligible commands into the immediate and the deferred pass,
    /// both in declared order
    pub fn partition(&self, source: TriggerSource, scope_id: ScopeId) -> (Vec<&Command>, Vec<&Command>) {
        self.commands
            .iter()
            .filter(|c| c.is_eligible(source, scope_id))
            .partition(|c| !c.late)
    }

    fn is_blocked_by_lock(&self) -> bool {
        if !self.lock.enabled {
            return false;
        }

        let present = match self.lock_file.is_present() {
            Ok(present) => present,
            Err(e) => {
                error!(
                    path = %self.lock.path.display(),
                    error = %e,
                    "Lock file check failed, skipping execution"
                );
                return true;
            }
        };

        if !self.lock.inverted && present {
            info!(path = %self.lock.path.display(), "Execution skipped as file lock is activated and present");
            return true;
        }
        if self.lock.inverted && !present {
            info!(path = %self.lock.path.display(), "Execution skipped as file lock is inverted and not present");
            return true;
        }
        false
    }

    async fn run_command(&self, command: &Command) -> ExecOutcome {
        match self.runner.run(&command.program, &command.args).await {
            Ok(output) => {
                if !output.combined.is_empty() {
                    info!(
                        command = %command.program,
                        scope_id = command.scope_id,
                        output = %output.combined.trim_end(),
                        "Command output"
                    );
                }
                debug!(
                    command = %command.program,
                    scope_id = command.scope_id,
                    duration_ms = output.duration_ms,
                    "Command executed without error"
                );
                ExecOutcome::Success
            }
            Err(e) => {
                if let Some(output) = e.output().filter(|o| !o.combined.is_empty()) {
                    info!(
                        command = %command.program,
                        scope_id = command.scope_id,
                        output = %output.combined.trim_end(),
                        "Command output"
                    );
                }
                error!(
                    command = %command.program,
                    scope_id = command.scope_id,
                    error = %e,
                    "Error on command execution"
                );
                ExecOutcome::Error
            }
        }
    }

    fn lock_housekeeping(&self) {
        if self.lock.create_after_late {
            match self.lock_file.create() {
                Ok(()) => info!(path = %self.lock.path.display(), "Lock file created after late command"),
                Err(e) => warn!(path = %self.lock.path.display(), error = %e, "Lock file creation failed"),
            }
        }
        if self.lock.delete_after_late {
            match self.lock_file.remove() {
                Ok(()) => info!(path = %self.lock.path.display(), "Lock file removed after late command"),
                Err(e) => warn!(path = %self.lock.path.display(), error = %e, "Lock file deletion failed"),
            }
        }
    }
}

#[async_trait]
impl Dispatcher for ExecutionGate {
    async fn dispatch(&self, source: TriggerSource, scope_id: ScopeId, suppress: bool) -> Dispatch {
        self.execute(source, scope_id, suppress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TriggerSet;
    use crate::port::command_runner::mocks::MockCommandRunner;
    use crate::port::lock_file::mocks::MockLockFile;

    fn cmd(program: &str, source: TriggerSource) -> Command {
        Command::new(program, vec![]).with_triggers(TriggerSet::default().with(source))
    }

    fn gate_with(
        commands: Vec<Command>,
        lock: FileLockSettings,
        lock_file: MockLockFile,
        runner: MockCommandRunner,
    ) -> ExecutionGate {
        ExecutionGate::new(commands, lock, Arc::new(lock_file), Arc::new(runner))
    }

    fn lock_settings(enabled: bool, inverted: bool) -> FileLockSettings {
        FileLockSettings {
            enabled,
            inverted,
            ..FileLockSettings::disabled()
        }
    }

    #[tokio::test]
    async fn test_suppress_short_circuits_before_lock_check() {
        let runner = MockCommandRunner::new();
        let gate = gate_with(
            vec![cmd("a", TriggerSource::Usb)],
            lock_settings(true, false),
            MockLockFile::broken(),
            runner.clone(),
        );

        let dispatch = gate.execute(TriggerSource::Usb, 0, true).await;

        assert_eq!(dispatch.outcome, ExecOutcome::NotExecuted);
        assert!(!dispatch.late_ran);
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_file_lock_gating_modes() {
        let cases = [
            // (inverted, present, blocked)
            (false, true, true),
            (false, false, false),
            (true, false, true),
            (true, true, false),
        ];

        for (inverted, present, blocked) in cases {
            let runner = MockCommandRunner::new();
            let gate = gate_with(
                vec![cmd("a", TriggerSource::Ping)],
                lock_settings(true, inverted),
                MockLockFile::new(present),
                runner.clone(),
            );

            let dispatch = gate.execute(TriggerSource::Ping, 0, false).await;

            if blocked {
                assert_eq!(dispatch.outcome, ExecOutcome::SkippedFileLock, "inverted={inverted} present={present}");
                assert_eq!(runner.call_count(), 0);
            } else {
                assert_eq!(dispatch.outcome, ExecOutcome::Success, "inverted={inverted} present={present}");
                assert_eq!(runner.call_count(), 1);
            }
        }
    }

    #[tokio::test]
    async fn test_disabled_lock_ignores_presence() {
        let runner = MockCommandRunner::new();
        let gate = gate_with(
            vec![cmd("a", TriggerSource::Web)],
            lock_settings(false, false),
            MockLockFile::new(true),
            runner.clone(),
        );

        let dispatch = gate.execute(TriggerSource::Web, 0, false).await;

        assert_eq!(dispatch.outcome, ExecOutcome::Success);
    }

    #[tokio::test]
    async fn test_lock_check_failure_skips_dispatch() {
        let runner = MockCommandRunner::new();
        let gate = gate_with(
            vec![cmd("a", TriggerSource::Usb)],
            lock_settings(true, false),
            MockLockFile::broken(),
            runner.clone(),
        );

        let dispatch = gate.execute(TriggerSource::Usb, 0, false).await;

        assert_eq!(dispatch.outcome, ExecOutcome::SkippedFileLock);
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_late_commands_run_after_immediate_in_relative_order() {
        let runner = MockCommandRunner::new();
        let commands = vec![
            cmd("late-1", TriggerSource::Usb).deferred(),
            cmd("first", TriggerSource::Usb),
            cmd("late-2", TriggerSource::Usb).deferred(),
            cmd("second", TriggerSource::Usb),
        ];
        let gate = gate_with(commands, FileLockSettings::disabled(), MockLockFile::default(), runner.clone());

        let dispatch = gate.execute(TriggerSource::Usb, 0, false).await;

        assert_eq!(runner.programs(), vec!["first", "second", "late-1", "late-2"]);
        assert_eq!(dispatch.outcome, ExecOutcome::Success);
        assert!(dispatch.late_ran);
    }

    #[tokio::test]
    async fn test_partition_never_mixes_late_into_immediate() {
        let commands = vec![
            cmd("a", TriggerSource::Web).deferred(),
            cmd("b", TriggerSource::Web),
            cmd("c", TriggerSource::Usb).deferred(),
            cmd("d", TriggerSource::Web).deferred(),
        ];
        let gate = gate_with(
            commands,
            FileLockSettings::disabled(),
            MockLockFile::default(),
            MockCommandRunner::new(),
        );

        let (immediate, late) = gate.partition(TriggerSource::Web, 0);

        assert!(immediate.iter().all(|c| !c.late));
        let late: Vec<&str> = late.iter().map(|c| c.program.as_str()).collect();
        assert_eq!(late, vec!["a", "d"]);
    }

    #[tokio::test]
    async fn test_scope_filtering() {
        let runner = MockCommandRunner::new();
        let commands = vec![
            cmd("global", TriggerSource::Ping).with_scope(-1),
            cmd("scope-1", TriggerSource::Ping).with_scope(1),
            cmd("scope-2", TriggerSource::Ping).with_scope(2),
        ];
        let gate = gate_with(commands, FileLockSettings::disabled(), MockLockFile::default(), runner.clone());

        gate.execute(TriggerSource::Ping, 2, false).await;

        assert_eq!(runner.programs(), vec!["global", "scope-2"]);
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_siblings() {
        let runner = MockCommandRunner::new().fail_on("broken");
        let commands = vec![
            cmd("broken", TriggerSource::Usb),
            cmd("fine", TriggerSource::Usb),
            cmd("late", TriggerSource::Usb).deferred(),
        ];
        let gate = gate_with(commands, FileLockSettings::disabled(), MockLockFile::default(), runner.clone());

        let dispatch = gate.execute(TriggerSource::Usb, 0, false).await;

        assert_eq!(runner.programs(), vec!["broken", "fine", "late"]);
        assert_eq!(dispatch.outcome, ExecOutcome::Error);
        assert!(dispatch.late_ran);
    }

    #[tokio::test]
    async fn test_failed_late_command_does_not_count_as_ran() {
        let runner = MockCommandRunner::new().fail_on("late");
        let commands = vec![cmd("late", TriggerSource::Time).deferred()];
        let gate = gate_with(commands, FileLockSettings::disabled(), MockLockFile::default(), runner);

        let dispatch = gate.execute(TriggerSource::Time, 0, false).await;

        assert_eq!(dispatch.outcome, ExecOutcome::Error);
        assert!(!dispatch.late_ran);
    }

    #[tokio::test]
    async fn test_no_eligible_commands_is_not_executed() {
        let runner = MockCommandRunner::new();
        let gate = gate_with(
            vec![cmd("usb-only", TriggerSource::Usb)],
            FileLockSettings::disabled(),
            MockLockFile::default(),
            runner.clone(),
        );

        let dispatch = gate.execute(TriggerSource::Interval, 0, false).await;

        assert_eq!(dispatch.outcome, ExecOutcome::NotExecuted);
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_lock_created_after_successful_late_run() {
        let lock_file = MockLockFile::new(false);
        let lock = FileLockSettings {
            enabled: true,
            create_after_late: true,
            ..FileLockSettings::disabled()
        };
        let gate = gate_with(
            vec![cmd("late", TriggerSource::Usb).deferred()],
            lock,
            lock_file.clone(),
            MockCommandRunner::new(),
        );

        gate.execute(TriggerSource::Usb, 0, false).await;
        assert!(lock_file.present());

        // Normal mode now blocks the next dispatch
        let second = gate.execute(TriggerSource::Usb, 0, false).await;
        assert_eq!(second.outcome, ExecOutcome::SkippedFileLock);
    }

    #[tokio::test]
    async fn test_lock_removed_after_successful_late_run() {
        let lock_file = MockLockFile::new(true);
        let lock = FileLockSettings {
            enabled: true,
            inverted: true,
            delete_after_late: true,
            ..FileLockSettings::disabled()
        };
        let gate = gate_with(
            vec![cmd("late", TriggerSource::Web).deferred()],
            lock,
            lock_file.clone(),
            MockCommandRunner::new(),
        );

        let first = gate.execute(TriggerSource::Web, 0, false).await;
        assert_eq!(first.outcome, ExecOutcome::Success);
        assert!(!lock_file.present());

        let second = gate.execute(TriggerSource::Web, 0, false).await;
        assert_eq!(second.outcome, ExecOutcome::SkippedFileLock);
    }

    #[tokio::test]
    async fn test_immediate_only_dispatch_keeps_lock() {
        let lock_file = MockLockFile::new(false);
        let lock = FileLockSettings {
            enabled: true,
            create_after_late: true,
            ..FileLockSettings::disabled()
        };
        let gate = gate_with(
            vec![cmd("now", TriggerSource::Usb)],
            lock,
            lock_file.clone(),
            MockCommandRunner::new(),
        );

        gate.execute(TriggerSource::Usb, 0, false).await;

        assert!(!lock_file.present());
    }
}
