//! Command-line flags

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use tripwire_core::domain::duration::parse_duration;
use tripwire_core::domain::{Command, MonitorConfig, TriggerSet};

/// Scope of the override command: eligible for every dispatch
const OVERRIDE_SCOPE: i32 = -1;

#[derive(Parser, Debug, Default)]
#[command(name = "tripwire")]
#[command(about = "Runs commands when USB devices, hosts, URLs or the clock change state", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Override the USB poll interval (e.g. 500ms, 2s, or plain milliseconds)
    #[arg(short, long, value_parser = parse_interval)]
    pub interval: Option<Duration>,

    /// Debug output
    #[arg(short, long)]
    pub debug: bool,

    /// Verbose output (device tables, ignored devices)
    #[arg(short = 'x', long)]
    pub verbose: bool,

    /// Detect, but never execute commands
    #[arg(short, long)]
    pub no_exec: bool,

    /// Replace all configured commands with this one
    #[arg(short, long)]
    pub command: Option<String>,

    /// Single argument passed to --command
    #[arg(short, long, requires = "command", allow_hyphen_values = true)]
    pub arguments: Option<String>,

    /// Config file
    #[arg(short = 'p', long, env = "TRIPWIRE_CONFIG")]
    pub config_path: Option<PathBuf>,
}

fn parse_interval(value: &str) -> Result<Duration, String> {
    let duration = parse_duration(value).map_err(|e| e.to_string())?;
    if duration.is_zero() {
        return Err("interval must be greater than zero".to_string());
    }
    Ok(duration)
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut MonitorConfig) {
        if let Some(interval) = self.interval {
            config.usb_interval = interval;
        }

        if let Some(program) = &self.command {
            let args = self.arguments.iter().cloned().collect();
            config.commands = vec![Command::new(program.clone(), args)
                .with_triggers(TriggerSet::all())
                .with_scope(OVERRIDE_SCOPE)];
        }
    }
}
