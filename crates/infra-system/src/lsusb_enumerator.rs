// USB device enumeration via `lsusb`
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use tripwire_core::domain::{DeviceSnapshot, UsbDevice};
use tripwire_core::port::{DeviceEnumerator, ProbeError};

const LSUSB: &str = "lsusb";

/// Parse `lsusb` output into a snapshot keyed by `vendor:product`.
///
/// Expected line shape: `Bus 001 Device 004: ID 046d:c52b Logitech, Inc. Unifying Receiver`.
/// Lines with fewer fields are skipped. Several devices with the same id
/// are counted per bus.
pub fn parse_lsusb(output: &str) -> DeviceSnapshot {
    let mut snapshot = DeviceSnapshot::new();

    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 {
            continue;
        }
        let bus = parts[1];
        let id = parts[5];
        let name = parts[6..].join(" ");

        snapshot
            .entry(id.to_string())
            .or_insert_with(|| UsbDevice::new(id, name))
            .attach(bus);
    }

    snapshot
}

/// Enumerates attached devices by running `lsusb`
pub struct LsusbEnumerator {
    program: String,
    args: Vec<String>,
}

impl LsusbEnumerator {
    pub fn new() -> Self {
        Self::with_command(LSUSB, Vec::new())
    }

    /// Use a different command with `lsusb`-compatible output
    pub fn with_command(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Default for LsusbEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceEnumerator for LsusbEnumerator {
    async fn enumerate(&self) -> Result<DeviceSnapshot, ProbeError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ProbeError::Enumeration(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(ProbeError::Enumeration(format!(
                "{} exited with {:?}: {}",
                self.program,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let snapshot = parse_lsusb(&String::from_utf8_lossy(&output.stdout));
        debug!(devices = snapshot.len(), "USB devices enumerated");
        Ok(snapshot)
    }
}
