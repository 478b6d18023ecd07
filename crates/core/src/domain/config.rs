// Monitor configuration model
//
// Loaded once at startup and read-only afterwards.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::command::Command;
use super::duration::serde_duration;
use super::error::{DomainError, Result};
use super::target::{IntervalTarget, PingTarget, TimeTarget, WebTarget};
use super::trigger::ScopeId;

/// Default lock file location
pub const DEFAULT_LOCK_PATH: &str = "/tmp/tripwire.lock";

/// Default log file location
pub const DEFAULT_LOG_FILE: &str = "/var/log/tripwire.log";

/// File lock gating and housekeeping settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLockSettings {
    pub enabled: bool,
    /// Block while the lock file is absent instead of present
    pub inverted: bool,
    pub path: PathBuf,
    /// Create the lock file after a successful late command
    pub create_after_late: bool,
    /// Remove the lock file after a successful late command
    pub delete_after_late: bool,
}

impl FileLockSettings {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            inverted: false,
            path: PathBuf::from(DEFAULT_LOCK_PATH),
            create_after_late: false,
            delete_after_late: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    #[serde(rename = "config_version")]
    pub version: String,

    pub file_lock: bool,
    #[serde(rename = "file_lock_inverted_mode")]
    pub file_lock_inverted: bool,
    pub file_lock_path: PathBuf,
    pub file_lock_deletion: bool,
    pub file_lock_creation: bool,

    #[serde(with = "serde_duration")]
    pub start_delay: Duration,

    /// Empty means stdout only
    pub log_file: String,
    /// Number of rotated log files to keep
    pub old_logs: i32,

    /// Promote ping precondition and transport errors to executions
    #[serde(rename = "execution_on_error")]
    pub exec_on_error: bool,

    pub usb_tracking: bool,
    #[serde(with = "serde_duration")]
    pub usb_interval: Duration,
    pub usb_ignored_ids: Vec<String>,
    #[serde(rename = "usb_command_id")]
    pub usb_scope_id: ScopeId,

    pub ping_tracking: bool,
    #[serde(with = "serde_duration")]
    pub ping_interval: Duration,
    pub ping_targets: Vec<PingTarget>,

    pub web_tracking: bool,
    #[serde(with = "serde_duration")]
    pub web_interval: Duration,
    pub web_targets: Vec<WebTarget>,

    pub time_tracking: bool,
    pub time_targets: Vec<TimeTarget>,

    pub interval_tracking: bool,
    pub interval_targets: Vec<IntervalTarget>,

    pub commands: Vec<Command>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            version: crate::VERSION.to_string(),
            file_lock: true,
            file_lock_inverted: false,
            file_lock_path: PathBuf::from(DEFAULT_LOCK_PATH),
            file_lock_deletion: false,
            file_lock_creation: true,
            start_delay: Duration::from_secs(3),
            log_file: DEFAULT_LOG_FILE.to_string(),
            old_logs: 1,
            exec_on_error: true,
            usb_tracking: false,
            usb_interval: Duration::from_millis(1000),
            usb_ignored_ids: Vec::new(),
            usb_scope_id: 0,
            ping_tracking: false,
            ping_interval: Duration::from_millis(10_000),
            ping_targets: Vec::new(),
            web_tracking: false,
            web_interval: Duration::from_millis(60_000),
            web_targets: Vec::new(),
            time_tracking: false,
            time_targets: Vec::new(),
            interval_tracking: false,
            interval_targets: Vec::new(),
            commands: Vec::new(),
        }
    }
}

impl MonitorConfig {
    /// Reject configurations the detectors cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.file_lock_creation && self.file_lock_deletion {
            return Err(DomainError::ConflictingLockHousekeeping);
        }
        if self.usb_tracking && self.usb_interval.is_zero() {
            return Err(DomainError::ZeroPollInterval("usb"));
        }
        if self.ping_tracking && self.ping_interval.is_zero() {
            return Err(DomainError::ZeroPollInterval("ping"));
        }
        if self.web_tracking && self.web_interval.is_zero() {
            return Err(DomainError::ZeroPollInterval("web"));
        }
        if self.interval_tracking {
            for (index, target) in self.interval_targets.iter().enumerate() {
                if target.interval.is_zero() {
                    return Err(DomainError::ZeroIntervalTarget(index));
                }
                if let (Some(start), Some(stop)) = (target.start, target.stop) {
                    if stop < start {
                        return Err(DomainError::InvertedIntervalWindow { index });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn file_lock_settings(&self) -> FileLockSettings {
        FileLockSettings {
            enabled: self.file_lock,
            inverted: self.file_lock_inverted,
            path: self.file_lock_path.clone(),
            create_after_late: self.file_lock_creation,
            delete_after_late: self.file_lock_deletion,
        }
    }
}
