use thiserror::Error;

/// Error taxonomy for a single execution.
///
/// All variants are reported synchronously to the caller; nothing is retried
/// internally. A fault never comes with a partial result.
#[derive(Error, Debug)]
pub enum ExecError {
    /// argv[0] could not be resolved to an executable; raised before any
    /// spawn attempt.
    #[error("command not available on {os}: {program}")]
    CommandUnavailable { os: &'static str, program: String },

    /// The underlying spawn call failed. Carries the cause's message only.
    #[error("failed to launch process: {0}")]
    Launch(String),

    /// The wall-clock deadline was exceeded, either in the readiness loop or
    /// while waiting for the exit status. The child is left running; the
    /// caller owns termination via the carried pid.
    #[error("deadline exceeded while running child process {pid}")]
    TimeoutExceeded { pid: u32 },

    /// A callback was supplied with an empty subscription set.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Unexpected pipe I/O failure while multiplexing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecError::TimeoutExceeded { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, ExecError::Configuration(_))
    }

    /// The pid of the still-running child, if this is a timeout fault.
    pub fn timed_out_pid(&self) -> Option<u32> {
        match self {
            ExecError::TimeoutExceeded { pid } => Some(*pid),
            _ => None,
        }
    }
}
