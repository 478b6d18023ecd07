// Domain Layer - Pure configuration models and outcome codes

pub mod command;
pub mod config;
pub mod device;
pub mod duration;
pub mod error;
pub mod outcome;
pub mod target;
pub mod trigger;

// Re-exports
pub use command::Command;
pub use config::{FileLockSettings, MonitorConfig};
pub use device::{DeviceId, DeviceSnapshot, UsbDevice};
pub use error::DomainError;
pub use outcome::{Dispatch, ExecOutcome, PingOutcome, TimeOutcome, WebOutcome};
pub use target::{IntervalTarget, PingTarget, TimeTarget, WebTarget};
pub use trigger::{ScopeId, TriggerSet, TriggerSource};
