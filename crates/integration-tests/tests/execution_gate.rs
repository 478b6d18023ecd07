//! Execution gate against real child processes and a real lock file

use std::fs;
use std::sync::Arc;

use tempfile::{tempdir, TempDir};
use tripwire_core::application::ExecutionGate;
use tripwire_core::domain::{Command, ExecOutcome, FileLockSettings, TriggerSet, TriggerSource};
use tripwire_core::port::time_provider::SystemTimeProvider;
use tripwire_core::port::LockFile;
use tripwire_infra_system::{FsLockFile, SubprocessRunner};

fn usb(program: &str, args: &[&str]) -> Command {
    Command::new(program, args.iter().map(|a| a.to_string()).collect())
        .with_triggers(TriggerSet::default().with(TriggerSource::Usb))
}

fn gate(commands: Vec<Command>, lock: FileLockSettings) -> ExecutionGate {
    let lock_file = Arc::new(FsLockFile::new(lock.path.clone()));
    ExecutionGate::new(
        commands,
        lock,
        lock_file,
        Arc::new(SubprocessRunner::new(Arc::new(SystemTimeProvider))),
    )
}

fn lock_in(dir: &TempDir) -> FileLockSettings {
    FileLockSettings {
        enabled: true,
        inverted: false,
        path: dir.path().join("tripwire.lock"),
        create_after_late: false,
        delete_after_late: false,
    }
}

#[tokio::test]
async fn test_true_succeeds() {
    let gate = gate(vec![usb("true", &[])], FileLockSettings::disabled());

    let dispatch = gate.execute(TriggerSource::Usb, 0, false).await;

    assert_eq!(dispatch.outcome, ExecOutcome::Success);
    assert!(!dispatch.late_ran);
}

#[tokio::test]
async fn test_false_and_missing_program_are_errors() {
    let failing = gate(vec![usb("false", &[])], FileLockSettings::disabled());
    assert_eq!(
        failing.execute(TriggerSource::Usb, 0, false).await.outcome,
        ExecOutcome::Error
    );

    let missing = gate(
        vec![usb("/nonexistent/tripwire-missing", &[])],
        FileLockSettings::disabled(),
    );
    assert_eq!(
        missing.execute(TriggerSource::Usb, 0, false).await.outcome,
        ExecOutcome::Error
    );
}

#[tokio::test]
async fn test_failure_does_not_stop_siblings_and_late_runs_last() {
    let dir = tempdir().unwrap();
    let trace = dir.path().join("trace");
    let append = |word: &str| usb("sh", &["-c", &format!("echo {word} >> {}", trace.display())]);

    let gate = gate(
        vec![
            append("late").deferred(),
            usb("false", &[]),
            append("first"),
            append("second"),
        ],
        FileLockSettings::disabled(),
    );

    let dispatch = gate.execute(TriggerSource::Usb, 0, false).await;

    assert_eq!(dispatch.outcome, ExecOutcome::Error);
    assert!(dispatch.late_ran);
    assert_eq!(fs::read_to_string(&trace).unwrap(), "first\nsecond\nlate\n");
}

#[tokio::test]
async fn test_present_lock_blocks_and_absent_allows() {
    let dir = tempdir().unwrap();
    let lock = lock_in(&dir);
    let gate = gate(vec![usb("true", &[])], lock.clone());

    assert_eq!(
        gate.execute(TriggerSource::Usb, 0, false).await.outcome,
        ExecOutcome::Success
    );

    fs::write(&lock.path, "").unwrap();
    assert_eq!(
        gate.execute(TriggerSource::Usb, 0, false).await.outcome,
        ExecOutcome::SkippedFileLock
    );
}

#[tokio::test]
async fn test_inverted_lock_requires_presence() {
    let dir = tempdir().unwrap();
    let lock = FileLockSettings {
        inverted: true,
        ..lock_in(&dir)
    };
    let gate = gate(vec![usb("true", &[])], lock.clone());

    assert_eq!(
        gate.execute(TriggerSource::Usb, 0, false).await.outcome,
        ExecOutcome::SkippedFileLock
    );

    fs::write(&lock.path, "").unwrap();
    assert_eq!(
        gate.execute(TriggerSource::Usb, 0, false).await.outcome,
        ExecOutcome::Success
    );
}

#[tokio::test]
async fn test_successful_late_command_creates_lock() {
    let dir = tempdir().unwrap();
    let lock = FileLockSettings {
        create_after_late: true,
        ..lock_in(&dir)
    };
    let gate = gate(vec![usb("true", &[]).deferred()], lock.clone());

    let first = gate.execute(TriggerSource::Usb, 0, false).await;
    assert!(first.late_ran);
    assert!(FsLockFile::new(&lock.path).is_present().unwrap());

    // The lock now blocks the next dispatch
    let second = gate.execute(TriggerSource::Usb, 0, false).await;
    assert_eq!(second.outcome, ExecOutcome::SkippedFileLock);
}

#[tokio::test]
async fn test_successful_late_command_removes_inverted_lock() {
    let dir = tempdir().unwrap();
    let lock = FileLockSettings {
        inverted: true,
        create_after_late: false,
        delete_after_late: true,
        ..lock_in(&dir)
    };
    fs::write(&lock.path, "").unwrap();
    let gate = gate(vec![usb("true", &[]).deferred()], lock.clone());

    let dispatch = gate.execute(TriggerSource::Usb, 0, false).await;

    assert!(dispatch.late_ran);
    assert!(!lock.path.exists());
}

#[tokio::test]
async fn test_failed_late_command_leaves_lock_alone() {
    let dir = tempdir().unwrap();
    let lock = FileLockSettings {
        create_after_late: true,
        ..lock_in(&dir)
    };
    let gate = gate(vec![usb("false", &[]).deferred()], lock.clone());

    let dispatch = gate.execute(TriggerSource::Usb, 0, false).await;

    assert_eq!(dispatch.outcome, ExecOutcome::Error);
    assert!(!dispatch.late_ran);
    assert!(!lock.path.exists());
}
