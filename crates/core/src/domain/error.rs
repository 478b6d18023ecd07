// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("File lock creation and deletion are both enabled")]
    ConflictingLockHousekeeping,

    #[error("Interval for {0} tracking must be greater than zero")]
    ZeroPollInterval(&'static str),

    #[error("Interval target #{0} has a zero interval")]
    ZeroIntervalTarget(usize),

    #[error("Interval target #{index} stops before it starts")]
    InvertedIntervalWindow { index: usize },

    #[error("Invalid duration '{0}'")]
    InvalidDuration(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
