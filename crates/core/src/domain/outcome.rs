// Outcome codes returned by the gate and the detectors

/// Result of running commands through the execution gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecOutcome {
    /// Every executed command exited successfully
    Success,
    /// At least one executed command failed
    Error,
    /// Nothing was executed
    NotExecuted,
    /// Blocked by the file lock
    SkippedFileLock,
}

impl ExecOutcome {
    /// Fold a per-command result into a running aggregate.
    ///
    /// `NotExecuted` is the identity and `Error` is absorbing.
    pub fn fold(self, next: ExecOutcome) -> ExecOutcome {
        if self == ExecOutcome::NotExecuted {
            return next;
        }
        if self == ExecOutcome::Error || next == ExecOutcome::Error {
            return ExecOutcome::Error;
        }
        ExecOutcome::Success
    }
}

impl std::fmt::Display for ExecOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecOutcome::Success => write!(f, "EXECUTED_SUCCESS"),
            ExecOutcome::Error => write!(f, "EXECUTED_ERROR"),
            ExecOutcome::NotExecuted => write!(f, "NOT_EXECUTED"),
            ExecOutcome::SkippedFileLock => write!(f, "SKIPPED_FILE_LOCK"),
        }
    }
}

/// Aggregate of one gate dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub outcome: ExecOutcome,
    /// At least one deferred command succeeded
    pub late_ran: bool,
}

impl Dispatch {
    pub fn skipped(outcome: ExecOutcome) -> Self {
        Self {
            outcome,
            late_ran: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingOutcome {
    /// Reply received under trigger-on-failure policy, nothing executed
    Success,
    /// No reply under trigger-on-success policy, nothing executed
    NoSuccess,
    /// Policy condition met (or error escalated) and the gate was called
    ExecutedOnPolicy,
    TransportError,
    InvalidTimeout,
}

/// Which web criterion matched last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebOutcome {
    NoTrigger,
    ContentSubstringMatch,
    ContentExactMatch,
    StatusCodeMatch,
    StatusCodeMismatch,
    TlsFailureMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOutcome {
    Pending,
    Fired,
    /// Timestamp passed outside its tolerance window
    Missed,
    AlreadyFired,
}
