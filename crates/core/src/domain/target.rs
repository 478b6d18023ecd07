// Detector target configurations

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::duration::serde_duration;
use super::trigger::ScopeId;

/// Host to be tracked with ICMP echo
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingTarget {
    pub target: String,

    /// Per-attempt timeout; zero is rejected at probe time
    #[serde(with = "serde_duration")]
    pub ping_timeout: Duration,

    /// Execute when a reply arrives (true) or when every attempt fails (false)
    pub on_success: bool,

    /// Additional attempts after the first one
    pub retry_count: u32,

    #[serde(with = "serde_duration")]
    pub retry_delay: Duration,

    #[serde(rename = "command_id")]
    pub scope_id: ScopeId,
}

/// URL to be tracked with HTTP GET
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebTarget {
    pub target: String,

    /// Content criterion; ignored when empty
    pub content: String,

    /// Exact body equality instead of substring containment
    pub content_is_exact: bool,

    /// Status criterion; ignored when zero
    pub status_code: i32,

    /// Match on equal status (true) or on differing status (false)
    pub on_code_identical: bool,

    /// Match when the response was not delivered over TLS
    pub on_https_fails: bool,

    /// Additional attempts after the first one
    pub retry_count: u32,

    #[serde(with = "serde_duration")]
    pub retry_delay: Duration,

    #[serde(rename = "command_id")]
    pub scope_id: ScopeId,
}

/// Single point in time that fires once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTarget {
    pub timestamp: DateTime<Utc>,

    /// How late after `timestamp` a detection may still fire
    #[serde(rename = "tolerance_window", with = "serde_duration", default)]
    pub tolerance: Duration,

    #[serde(rename = "command_id", default)]
    pub scope_id: ScopeId,
}

/// Recurring trigger between optional start and stop instants
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalTarget {
    #[serde(with = "serde_duration")]
    pub interval: Duration,

    #[serde(rename = "start_at")]
    pub start: Option<DateTime<Utc>>,

    #[serde(rename = "stop_at")]
    pub stop: Option<DateTime<Utc>>,

    /// Fire once immediately when the interval starts
    pub execute_on_start: bool,

    #[serde(rename = "command_id")]
    pub scope_id: ScopeId,
}
