//! Error types for probekit.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving ffprobe or decoding its reports.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input path does not exist. Checked before any process is spawned.
    #[error("input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// The ffprobe binary could not be located.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// ffprobe ran and exited with a non-zero status.
    #[error("ffprobe exited with status {exit_code}: {stderr}")]
    ProcessFailed { exit_code: i32, stderr: String },

    /// ffprobe output could not be decoded into the expected report.
    #[error("failed to decode ffprobe output: {message}")]
    DecodeFailed { message: String },

    /// An asynchronous run was cancelled before the process completed.
    #[error("probe cancelled")]
    Cancelled,

    /// Unsupported operation on this platform.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an input not found error.
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a process failed error from an exit code and captured stderr.
    pub fn process_failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::ProcessFailed {
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Create a decode failed error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::DecodeFailed {
            message: err.to_string(),
        }
    }
}
