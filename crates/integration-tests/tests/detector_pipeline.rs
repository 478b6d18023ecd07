//! Detectors driving a real execution gate and real child processes

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::{tempdir, TempDir};
use tripwire_core::application::{ExecutionGate, PingDetector, TimeDetector, UsbDetector, WebDetector};
use tripwire_core::domain::{
    Command, FileLockSettings, PingOutcome, PingTarget, TimeOutcome, TimeTarget, TriggerSet, TriggerSource,
    WebOutcome, WebTarget,
};
use tripwire_core::port::http_fetcher::mocks::MockHttpFetcher;
use tripwire_core::port::icmp_prober::mocks::{EchoScript, MockIcmpProber};
use tripwire_core::port::time_provider::mocks::MockTimeProvider;
use tripwire_core::port::time_provider::SystemTimeProvider;
use tripwire_infra_system::{LsusbEnumerator, SubprocessRunner};

/// Commands append their trigger name to `<dir>/trace`
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self { dir: tempdir().unwrap() }
    }

    fn trace_path(&self) -> PathBuf {
        self.dir.path().join("trace")
    }

    fn trace(&self) -> Vec<String> {
        fs::read_to_string(self.trace_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn gate(&self, scope_id: i32) -> Arc<ExecutionGate> {
        let commands = [
            TriggerSource::Usb,
            TriggerSource::Ping,
            TriggerSource::Web,
            TriggerSource::Time,
        ]
        .into_iter()
        .map(|source| {
            Command::new(
                "sh",
                vec![
                    "-c".to_string(),
                    format!("echo {source} >> {}", self.trace_path().display()),
                ],
            )
            .with_triggers(TriggerSet::default().with(source))
            .with_scope(scope_id)
        })
        .collect();

        Arc::new(ExecutionGate::new(
            commands,
            FileLockSettings::disabled(),
            Arc::new(tripwire_infra_system::FsLockFile::new(self.dir.path().join("unused.lock"))),
            Arc::new(SubprocessRunner::new(Arc::new(SystemTimeProvider))),
        ))
    }

    /// Stand-in for `lsusb` printing the contents of `devices`
    fn fake_lsusb(devices: &Path) -> LsusbEnumerator {
        LsusbEnumerator::with_command("cat", vec![devices.display().to_string()])
    }
}

#[tokio::test]
async fn test_usb_changes_run_commands() {
    let fixture = Fixture::new();
    let devices = fixture.dir.path().join("devices");
    fs::write(&devices, "Bus 001 Device 001: ID 1d6b:0002 Linux Foundation 2.0 root hub\n").unwrap();

    let detector = UsbDetector::new(
        Arc::new(Fixture::fake_lsusb(&devices)),
        fixture.gate(0),
        vec!["1d6b:0003".to_string()],
        0,
    );
    detector.init(true).await;

    // Plugging a stick and an ignored hub: only the stick runs commands
    fs::write(
        &devices,
        "Bus 001 Device 001: ID 1d6b:0002 Linux Foundation 2.0 root hub\n\
         Bus 002 Device 001: ID 1d6b:0003 Linux Foundation 3.0 root hub\n\
         Bus 001 Device 007: ID 0781:5581 SanDisk Corp. Ultra\n",
    )
    .unwrap();
    let report = detector.track(false, false).await.unwrap();
    assert_eq!(report.events.len(), 2);
    assert_eq!(report.dispatched, 1);
    assert_eq!(fixture.trace(), vec!["USB"]);

    // Unplugging the stick
    fs::write(&devices, "Bus 001 Device 001: ID 1d6b:0002 Linux Foundation 2.0 root hub\n").unwrap();
    detector.track(false, false).await.unwrap();
    assert_eq!(fixture.trace(), vec!["USB", "USB"]);
}

#[tokio::test]
async fn test_usb_suppressed_runs_nothing() {
    let fixture = Fixture::new();
    let devices = fixture.dir.path().join("devices");
    fs::write(&devices, "").unwrap();

    let detector = UsbDetector::new(
        Arc::new(Fixture::fake_lsusb(&devices)),
        fixture.gate(0),
        Vec::new(),
        0,
    );
    detector.init(false).await;

    fs::write(&devices, "Bus 001 Device 007: ID 0781:5581 SanDisk Corp. Ultra\n").unwrap();
    let report = detector.track(true, false).await.unwrap();

    assert_eq!(report.dispatched, 1);
    assert!(fixture.trace().is_empty());
}

#[tokio::test]
async fn test_ping_failure_policy_runs_scoped_command() {
    let fixture = Fixture::new();
    let detector = PingDetector::new(
        Arc::new(MockIcmpProber::always(EchoScript::Silence)),
        fixture.gate(5),
        vec![
            PingTarget {
                target: "10.0.0.1".to_string(),
                ping_timeout: std::time::Duration::from_millis(10),
                scope_id: 5,
                ..PingTarget::default()
            },
            PingTarget {
                target: "10.0.0.2".to_string(),
                ping_timeout: std::time::Duration::from_millis(10),
                scope_id: 6,
                ..PingTarget::default()
            },
        ],
        false,
    );

    let outcomes = detector.track(false, false).await;

    assert_eq!(outcomes, vec![PingOutcome::ExecutedOnPolicy, PingOutcome::ExecutedOnPolicy]);
    // Only the scope-5 target matches the configured commands
    assert_eq!(fixture.trace(), vec!["PING"]);
}

#[tokio::test]
async fn test_web_status_match_runs_command_once() {
    let fixture = Fixture::new();
    let detector = WebDetector::new(
        Arc::new(MockHttpFetcher::responding(200, true, "<html>ok</html>")),
        fixture.gate(0),
        vec![WebTarget {
            target: "https://example.com".to_string(),
            status_code: 200,
            on_code_identical: true,
            ..WebTarget::default()
        }],
    );

    let outcomes = detector.track(false, false).await;

    assert_eq!(outcomes, vec![WebOutcome::StatusCodeMatch]);
    assert_eq!(fixture.trace(), vec!["WEB"]);
}

#[tokio::test]
async fn test_time_target_fires_once() {
    let fixture = Fixture::new();
    let fire_at = Utc.with_ymd_and_hms(2030, 5, 1, 6, 0, 0).unwrap();
    let clock = Arc::new(MockTimeProvider::new(fire_at - chrono::Duration::seconds(1)));
    let detector = TimeDetector::new(
        clock.clone(),
        fixture.gate(0),
        vec![TimeTarget {
            timestamp: fire_at,
            tolerance: std::time::Duration::from_secs(2),
            scope_id: 0,
        }],
    );

    assert_eq!(detector.check(false).await, vec![TimeOutcome::Pending]);
    clock.advance(chrono::Duration::seconds(1));
    assert_eq!(detector.check(false).await, vec![TimeOutcome::Fired]);
    clock.advance(chrono::Duration::seconds(1));
    assert_eq!(detector.check(false).await, vec![TimeOutcome::AlreadyFired]);

    assert_eq!(fixture.trace(), vec!["TIME"]);
}
