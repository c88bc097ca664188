//! Status and error classification for per-account task runs.
//!
//! The task engine reports either a numeric status code with a message, or a
//! tagged error. Both are plain data; the orchestrator never needs to
//! downcast anything to recover the error kind.

/// Classified outcome of one task engine invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Status code 0: all tasks for the account completed.
    Success,
    /// Status code 1: the account's tasks were intentionally not executed.
    Skipped,
    /// Status code 3: the remote service demands a manual captcha.
    Captcha,
    /// Any other status code.
    Failed(i32),
}

impl TaskStatus {
    /// Map a task engine status code onto the closed status enumeration.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::Skipped,
            3 => Self::Captcha,
            other => Self::Failed(other),
        }
    }
}

/// Raw reply from the task engine: status code plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineReply {
    pub code: i32,
    pub message: String,
}

/// Error kinds the task engine can report, beyond classified status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Account cookie rejected by the remote service.
    Cookie,
    /// Super-token (stoken) invalid or expired.
    Stoken,
    /// Anything else: spawn failure, timeout, engine crash.
    Unknown,
}

impl ErrorKind {
    /// User-facing label, kept in the original product's language.
    pub fn label(self) -> &'static str {
        match self {
            Self::Cookie => "Cookie错误",
            Self::Stoken => "Stoken错误",
            Self::Unknown => "未知错误",
        }
    }
}

/// Tagged engine failure. One bad account is recorded and the batch moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl EngineError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn unknown(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, detail)
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.detail)
    }
}

impl std::error::Error for EngineError {}
