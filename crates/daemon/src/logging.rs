//! Log file rotation and tracing setup

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn rotated(path: &Path, generation: i32) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{generation}"));
    PathBuf::from(name)
}

/// Rotate the previous run's log file.
///
/// `old_logs < 1` deletes it; otherwise `log.N-1 -> log.N ... log -> log.1`,
/// dropping anything beyond `old_logs` generations.
pub fn rotate_logs(path: &Path, old_logs: i32) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if old_logs < 1 {
        return fs::remove_file(path);
    }

    for generation in (1..old_logs).rev() {
        let from = rotated(path, generation);
        if from.exists() {
            fs::rename(&from, rotated(path, generation + 1))?;
        }
    }
    fs::rename(path, rotated(path, 1))
}

fn fmt_layer<W>(writer: W, json: bool, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        fmt::layer().json().with_writer(writer).boxed()
    } else if ansi {
        fmt::layer().pretty().with_writer(writer).boxed()
    } else {
        fmt::layer().with_ansi(false).with_writer(writer).boxed()
    }
}

/// Open `path` for appending, creating missing parent directories
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber: stdout plus, when `log_file` is set and can
/// be opened, an appending non-blocking file writer.
///
/// An unusable log file leaves logging on stdout only and is reported once
/// the subscriber is up. `TRIPWIRE_LOG_FORMAT=json` switches both sinks to
/// JSON; `RUST_LOG` overrides the level filter. Keep the returned guard alive
/// until exit.
pub fn init_tracing(log_file: &str, debug: bool) -> Result<Option<WorkerGuard>> {
    let json = std::env::var("TRIPWIRE_LOG_FORMAT").is_ok_and(|format| format == "json");
    let default_directive = if debug { "tripwire=debug" } else { "tripwire=info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .context("Failed to create env filter")?;

    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(io::stdout, json, true)];
    let mut guard = None;
    let mut open_error = None;

    if !log_file.is_empty() {
        match open_log_file(Path::new(log_file)) {
            Ok(file) => {
                let (writer, worker_guard) = tracing_appender::non_blocking(file);
                layers.push(fmt_layer(writer, json, false));
                guard = Some(worker_guard);
            }
            Err(e) => open_error = Some(e),
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(e) = open_error {
        tracing::warn!(log_file, error = %e, "Log file unavailable, logging to stdout only");
    }

    Ok(guard)
}
