// Errors reported by observation ports (device enumeration, ICMP, HTTP)

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Target could not be parsed or resolved
    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// Send/receive or connect failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Device enumeration failed; distinct from "no devices attached"
    #[error("Enumeration failed: {0}")]
    Enumeration(String),
}
