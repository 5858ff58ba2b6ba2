//! Error types for the stepping engine
//!
//! Errors fall into three families:
//!
//! - [`AlgorithmError`]: raised by the running algorithm itself. Surfaced to the
//!   user and terminates the execution host.
//! - [`TimeoutError`]: synthesized by the watchdog when the host stops talking.
//!   Its origin is unknown, so it carries [`ErrorLocation::Unknown`].
//! - [`ProtocolError`]: an invariant violation on the coordinating side (stepping
//!   when not allowed, a malformed message sequence). These are bugs and are
//!   returned as `Err` to the caller instead of being reported to the user.
//!
//! [`SessionError`] wraps all of them for the session API.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Where an error originated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    Source { file: String, line: u32, column: u32 },
    Unknown,
}

impl ErrorLocation {
    /// Location of the caller (see `#[track_caller]`)
    #[track_caller]
    pub fn caller() -> Self {
        let loc = std::panic::Location::caller();
        ErrorLocation::Source {
            file: loc.file().to_string(),
            line: loc.line(),
            column: loc.column(),
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, ErrorLocation::Source { .. })
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLocation::Source { file, line, column } => {
                write!(f, "{}:{}:{}", file, line, column)
            }
            ErrorLocation::Unknown => write!(f, "<unknown location>"),
        }
    }
}

/// A fault raised by algorithm code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {location}")]
pub struct AlgorithmError {
    pub message: String,
    pub location: ErrorLocation,
}

impl AlgorithmError {
    /// Create an error located at the call site
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        AlgorithmError {
            message: message.into(),
            location: ErrorLocation::caller(),
        }
    }

    /// Create an error whose origin cannot be determined
    pub fn unlocated(message: impl Into<String>) -> Self {
        AlgorithmError {
            message: message.into(),
            location: ErrorLocation::Unknown,
        }
    }
}

impl From<PatchError> for AlgorithmError {
    #[track_caller]
    fn from(err: PatchError) -> Self {
        AlgorithmError::new(err.to_string())
    }
}

/// The watchdog gave up waiting for the execution host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("algorithm did not respond within {}ms (possible infinite loop) at {location}", .after.as_millis())]
pub struct TimeoutError {
    pub after: Duration,
    pub location: ErrorLocation,
}

impl TimeoutError {
    pub fn new(after: Duration) -> Self {
        TimeoutError {
            after,
            location: ErrorLocation::Unknown,
        }
    }
}

/// Invariant violations on the coordinating side
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("cannot step forward: no buffered steps and nothing in flight")]
    CannotStepForward,

    #[error("cannot step back: already at the initial state")]
    CannotStepBack,

    #[error("a prompt is already outstanding")]
    PromptOutstanding,

    #[error("no prompt is waiting for a result")]
    NoPromptOutstanding,

    #[error("execution host disconnected without finishing")]
    HostDisconnected,

    #[error("no execution host is running")]
    HostNotRunning,

    #[error("recorded history no longer applies to the display: {0}")]
    CorruptHistory(#[from] PatchError),
}

/// A patch could not be applied to a state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("node '{0}' does not exist")]
    MissingNode(String),

    #[error("edge '{0}' does not exist")]
    MissingEdge(String),

    #[error("edge '{edge}' references missing node '{node}'")]
    DanglingEdge { edge: String, node: String },
}

/// The synchronization channel refused an operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("prompt answer is {len} characters, the channel holds at most {max}")]
    PayloadTooLong { len: usize, max: usize },
}

/// Errors surfaced by the session API
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("algorithm error: {0}")]
    Algorithm(#[from] AlgorithmError),

    #[error("timeout: {0}")]
    Timeout(#[from] TimeoutError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("invalid graph: {0}")]
    Patch(#[from] PatchError),

    #[error("failed to serialize initial state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to spawn execution host: {0}")]
    Spawn(#[from] std::io::Error),
}

impl SessionError {
    /// True for errors that end the current algorithm run and are shown to the user
    pub fn is_user_facing(&self) -> bool {
        matches!(self, SessionError::Algorithm(_) | SessionError::Timeout(_))
    }

    pub fn location(&self) -> Option<&ErrorLocation> {
        match self {
            SessionError::Algorithm(e) => Some(&e.location),
            SessionError::Timeout(e) => Some(&e.location),
            _ => None,
        }
    }
}
