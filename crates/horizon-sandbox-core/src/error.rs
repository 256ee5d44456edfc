//! Error types for Horizon Sandbox.

use std::fmt;

use crate::object::ObjectError;

/// The main error type for Horizon Sandbox operations.
#[derive(Debug)]
pub enum SandboxError {
    /// Timer-related error.
    Timer(TimerError),
    /// Object-related error.
    Object(ObjectError),
    /// An unrecoverable precondition failure.
    Fatal(FatalError),
}

impl fmt::Display for SandboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timer(err) => write!(f, "Timer error: {err}"),
            Self::Object(err) => write!(f, "Object error: {err}"),
            Self::Fatal(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SandboxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timer(err) => Some(err),
            Self::Object(err) => Some(err),
            Self::Fatal(err) => Some(err),
        }
    }
}

/// Timer-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The timer ID is invalid or has already been removed.
    InvalidTimerId,
    /// A repeating timer was requested with a zero interval.
    ZeroInterval,
    /// The event loop that owned the timer is gone.
    LoopExited,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimerId => write!(f, "Invalid or expired timer ID"),
            Self::ZeroInterval => write!(f, "Timer interval must be greater than zero"),
            Self::LoopExited => write!(f, "The event loop owning this timer has been dropped"),
        }
    }
}

impl std::error::Error for TimerError {}

/// A fail-fast error: an invalid precondition that must terminate the process.
///
/// Library code never exits on its own. It hands a `FatalError` back to the
/// caller and the program's entry point decides to log it and terminate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalError {
    reason: String,
}

impl FatalError {
    /// Create a fatal error with a human-readable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The reason this error was raised.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fatal: {}", self.reason)
    }
}

impl std::error::Error for FatalError {}

impl From<TimerError> for SandboxError {
    fn from(err: TimerError) -> Self {
        Self::Timer(err)
    }
}

impl From<ObjectError> for SandboxError {
    fn from(err: ObjectError) -> Self {
        Self::Object(err)
    }
}

impl From<FatalError> for SandboxError {
    fn from(err: FatalError) -> Self {
        Self::Fatal(err)
    }
}

/// A specialized Result type for Horizon Sandbox operations.
pub type Result<T> = std::result::Result<T, SandboxError>;
