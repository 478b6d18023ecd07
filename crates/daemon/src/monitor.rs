//! Detector wiring and periodic scheduling

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use tripwire_core::application::{
    ExecutionGate, IntervalDetector, PingDetector, ShutdownToken, TimeDetector, UsbDetector, WebDetector,
};
use tripwire_core::domain::MonitorConfig;
use tripwire_core::port::{CommandRunner, DeviceEnumerator, HttpFetcher, IcmpProber, LockFile, TimeProvider};

/// How often timestamps are compared against the clock
const TIME_CHECK_PERIOD: Duration = Duration::from_secs(1);

/// Adapters the monitor is built from
pub struct Ports {
    pub runner: Arc<dyn CommandRunner>,
    pub lock_file: Arc<dyn LockFile>,
    pub enumerator: Arc<dyn DeviceEnumerator>,
    pub prober: Arc<dyn IcmpProber>,
    pub fetcher: Arc<dyn HttpFetcher>,
    pub clock: Arc<dyn TimeProvider>,
}

/// Operator switches from the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Detect but never execute
    pub suppress: bool,
    pub debug: bool,
    pub verbose: bool,
}

pub struct Monitor {
    config: MonitorConfig,
    options: RunOptions,
    usb: Arc<UsbDetector>,
    ping: Arc<PingDetector>,
    web: Arc<WebDetector>,
    time: Arc<TimeDetector>,
    interval: Arc<IntervalDetector>,
}

impl Monitor {
    pub fn new(config: MonitorConfig, ports: Ports, options: RunOptions) -> Self {
        let gate = Arc::new(ExecutionGate::new(
            config.commands.clone(),
            config.file_lock_settings(),
            ports.lock_file,
            ports.runner,
        ));

        let usb = Arc::new(UsbDetector::new(
            ports.enumerator,
            gate.clone(),
            config.usb_ignored_ids.iter().cloned(),
            config.usb_scope_id,
        ));
        let ping = Arc::new(PingDetector::new(
            ports.prober,
            gate.clone(),
            config.ping_targets.clone(),
            config.exec_on_error,
        ));
        let web = Arc::new(WebDetector::new(ports.fetcher, gate.clone(), config.web_targets.clone()));
        let time = Arc::new(TimeDetector::new(
            ports.clock.clone(),
            gate.clone(),
            config.time_targets.clone(),
        ));
        let interval = Arc::new(IntervalDetector::new(ports.clock, gate));

        Self {
            config,
            options,
            usb,
            ping,
            web,
            time,
            interval,
        }
    }

    /// Populate the USB device cache before the first poll
    pub async fn init(&self) {
        if self.config.usb_tracking {
            self.usb.init(self.options.verbose).await;
        }
    }

    /// Start one loop per enabled detector
    pub fn start(&self, shutdown: ShutdownToken) -> Vec<JoinHandle<()>> {
        let RunOptions {
            suppress,
            debug,
            verbose,
        } = self.options;
        let mut handles = Vec::new();

        if self.config.usb_tracking {
            let usb = self.usb.clone();
            handles.push(spawn_poll_loop("usb", self.config.usb_interval, shutdown.clone(), move || {
                let usb = usb.clone();
                async move {
                    // Skips and enumeration failures are already logged
                    let _ = usb.track(suppress, verbose).await;
                }
            }));
        }

        if self.config.ping_tracking {
            let ping = self.ping.clone();
            handles.push(spawn_poll_loop("ping", self.config.ping_interval, shutdown.clone(), move || {
                let ping = ping.clone();
                async move {
                    let outcomes = ping.track(suppress, debug).await;
                    debug!(outcomes = ?outcomes, "Ping poll finished");
                }
            }));
        }

        if self.config.web_tracking {
            let web = self.web.clone();
            handles.push(spawn_poll_loop("web", self.config.web_interval, shutdown.clone(), move || {
                let web = web.clone();
                async move {
                    let outcomes = web.track(suppress, debug).await;
                    debug!(outcomes = ?outcomes, "Web poll finished");
                }
            }));
        }

        if self.config.time_tracking {
            let time = self.time.clone();
            handles.push(spawn_poll_loop("time", TIME_CHECK_PERIOD, shutdown.clone(), move || {
                let time = time.clone();
                async move {
                    time.check(suppress).await;
                }
            }));
        }

        if self.config.interval_tracking {
            for target in self.config.interval_targets.iter().cloned() {
                let detector = self.interval.clone();
                let token = shutdown.clone();
                handles.push(tokio::spawn(async move {
                    detector.run(&target, suppress, token).await;
                }));
            }
        }

        info!(loops = handles.len(), "Detectors started");
        handles
    }
}

/// Tick every `period`; each tick runs `poll` as its own task so a slow poll
/// never delays the schedule.
fn spawn_poll_loop<F, Fut>(name: &'static str, period: Duration, mut shutdown: ShutdownToken, poll: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        info!(detector = name, period_ms = period.as_millis() as u64, "Detector loop started");
        let mut tick = interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    tokio::spawn(poll());
                }
                _ = shutdown.wait() => {
                    info!(detector = name, "Detector loop stopped");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripwire_core::application::shutdown_channel;
    use tripwire_core::domain::{Command, DeviceSnapshot, IntervalTarget, TriggerSet, UsbDevice};
    use tripwire_core::port::command_runner::mocks::MockCommandRunner;
    use tripwire_core::port::device_enumerator::mocks::MockDeviceEnumerator;
    use tripwire_core::port::http_fetcher::mocks::MockHttpFetcher;
    use tripwire_core::port::icmp_prober::mocks::{EchoScript, MockIcmpProber};
    use tripwire_core::port::lock_file::mocks::MockLockFile;
    use tripwire_core::port::time_provider::SystemTimeProvider;

    fn ports(runner: MockCommandRunner, enumerator: MockDeviceEnumerator) -> Ports {
        Ports {
            runner: Arc::new(runner),
            lock_file: Arc::new(MockLockFile::new(false)),
            enumerator: Arc::new(enumerator),
            prober: Arc::new(MockIcmpProber::always(EchoScript::Silence)),
            fetcher: Arc::new(MockHttpFetcher::unreachable()),
            clock: Arc::new(SystemTimeProvider),
        }
    }

    fn config() -> MonitorConfig {
        MonitorConfig {
            file_lock: false,
            commands: vec![Command::new("notify", vec![]).with_triggers(TriggerSet::all())],
            ..MonitorConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_usb_loop_dispatches_new_device() {
        let runner = MockCommandRunner::new();
        let enumerator = MockDeviceEnumerator::new(DeviceSnapshot::new());
        let monitor = Monitor::new(
            MonitorConfig {
                usb_tracking: true,
                ..config()
            },
            ports(runner.clone(), enumerator.clone()),
            RunOptions::default(),
        );
        monitor.init().await;

        let (tx, token) = shutdown_channel();
        let handles = monitor.start(token);

        let mut snapshot = DeviceSnapshot::new();
        snapshot.insert("abcd:0001".to_string(), UsbDevice::new("abcd:0001", "stick").with_bus("001", 1));
        enumerator.set_snapshot(snapshot);
        tokio::time::sleep(Duration::from_millis(2500)).await;

        tx.shutdown();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(runner.programs(), vec!["notify".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_exec_never_runs_commands() {
        let runner = MockCommandRunner::new();
        let monitor = Monitor::new(
            MonitorConfig {
                ping_tracking: true,
                ping_targets: vec![Default::default()],
                ..config()
            },
            ports(runner.clone(), MockDeviceEnumerator::new(DeviceSnapshot::new())),
            RunOptions {
                suppress: true,
                ..RunOptions::default()
            },
        );

        let (tx, token) = shutdown_channel();
        let handles = monitor.start(token);
        tokio::time::sleep(Duration::from_secs(25)).await;

        tx.shutdown();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_disabled_detectors_start_nothing() {
        let monitor = Monitor::new(
            MonitorConfig {
                interval_targets: vec![IntervalTarget {
                    interval: Duration::from_secs(1),
                    ..IntervalTarget::default()
                }],
                ..config()
            },
            ports(MockCommandRunner::new(), MockDeviceEnumerator::new(DeviceSnapshot::new())),
            RunOptions::default(),
        );
        let (_tx, token) = shutdown_channel();

        assert!(monitor.start(token).is_empty());
    }
}
