//! Tripwire - Main Entry Point
//! Watches USB devices, hosts, URLs and the clock; runs commands on change

mod cli;
mod config_loader;
mod logging;
mod monitor;

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use tripwire_core::application::shutdown_channel;
use tripwire_core::port::time_provider::SystemTimeProvider;
use tripwire_infra_system::reqwest_fetcher::DEFAULT_REQUEST_TIMEOUT;
use tripwire_infra_system::{FsLockFile, LsusbEnumerator, ReqwestFetcher, SubprocessRunner, SystemPinger};

use cli::Cli;
use config_loader::{resolve_config_path, ConfigLoader};
use monitor::{Monitor, Ports, RunOptions};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upper bound for detector loops to wind down after Ctrl-C
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Parse flags and load configuration
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config_path.as_deref());
    let mut config = ConfigLoader::default().load(config_path.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    // 2. Rotate the previous log, then initialize logging
    let rotation = if config.log_file.is_empty() {
        Ok(())
    } else {
        logging::rotate_logs(Path::new(&config.log_file), config.old_logs)
    };
    let _log_guard = logging::init_tracing(&config.log_file, cli.debug)?;

    info!("Tripwire v{} starting...", VERSION);
    match &config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("No config file found, using defaults"),
    }
    if let Err(e) = rotation {
        warn!(log_file = %config.log_file, error = %e, "Log rotation failed");
    }
    if config.version != VERSION {
        warn!(config_version = %config.version, "Config was written for a different version");
    }
    debug!(config = ?config, "Effective configuration");
    if cli.no_exec {
        info!("No-exec mode: detections are logged, commands never run");
    }

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let fetcher = ReqwestFetcher::new(DEFAULT_REQUEST_TIMEOUT)
        .map_err(|e| anyhow::anyhow!("HTTP client creation failed: {}", e))?;
    let ports = Ports {
        runner: Arc::new(SubprocessRunner::new(time_provider.clone())),
        lock_file: Arc::new(FsLockFile::new(config.file_lock_path.clone())),
        enumerator: Arc::new(LsusbEnumerator::new()),
        prober: Arc::new(SystemPinger::new()),
        fetcher: Arc::new(fetcher),
        clock: time_provider,
    };
    let options = RunOptions {
        suppress: cli.no_exec,
        debug: cli.debug,
        verbose: cli.verbose,
    };

    // 4. Give the system time to settle
    if !config.start_delay.is_zero() {
        info!(delay_ms = config.start_delay.as_millis() as u64, "Delaying start");
        tokio::time::sleep(config.start_delay).await;
    }

    // 5. Prime the device cache and start the detectors
    let monitor = Monitor::new(config, ports, options);
    monitor.init().await;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let handles = monitor.start(shutdown_rx);

    info!("System ready. Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 7. Graceful shutdown
    shutdown_tx.shutdown();
    let joined = tokio::time::timeout(SHUTDOWN_GRACE, futures::future::join_all(handles)).await;
    if joined.is_err() {
        warn!("Detector loops did not stop in time");
    }

    info!("Shutdown complete.");

    Ok(())
}
