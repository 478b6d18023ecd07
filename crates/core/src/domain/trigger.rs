// Trigger Domain Model

use serde::{Deserialize, Serialize};

/// Subsystem that requested a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerSource {
    Usb,
    Ping,
    Web,
    Time,
    Interval,
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerSource::Usb => write!(f, "USB"),
            TriggerSource::Ping => write!(f, "PING"),
            TriggerSource::Web => write!(f, "WEB"),
            TriggerSource::Time => write!(f, "TIME"),
            TriggerSource::Interval => write!(f, "INTERVAL"),
        }
    }
}

/// Scope id carried by a dispatch. Negative command scopes match every caller.
pub type ScopeId = i32;

/// Set of trigger sources a command listens to.
///
/// Flattened into the command's YAML mapping as one boolean key per source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerSet {
    pub usb: bool,
    pub ping: bool,
    pub web: bool,
    pub time: bool,
    pub interval: bool,
}

impl TriggerSet {
    /// Every trigger source enabled
    pub fn all() -> Self {
        Self {
            usb: true,
            ping: true,
            web: true,
            time: true,
            interval: true,
        }
    }

    pub fn contains(&self, source: TriggerSource) -> bool {
        match source {
            TriggerSource::Usb => self.usb,
            TriggerSource::Ping => self.ping,
            TriggerSource::Web => self.web,
            TriggerSource::Time => self.time,
            TriggerSource::Interval => self.interval,
        }
    }

    pub fn with(mut self, source: TriggerSource) -> Self {
        match source {
            TriggerSource::Usb => self.usb = true,
            TriggerSource::Ping => self.ping = true,
            TriggerSource::Web => self.web = true,
            TriggerSource::Time => self.time = true,
            TriggerSource::Interval => self.interval = true,
        }
        self
    }
}
