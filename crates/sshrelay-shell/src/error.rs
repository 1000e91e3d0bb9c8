//! Error types for the sshrelay-shell crate.
//!
//! Display strings double as client-facing `error` message text, so the
//! authentication case must stay distinguishable from generic SSH failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    /// The target host rejected the credentials. Reported distinctly so
    /// clients can prompt for new credentials.
    #[error("Authentication failed.")]
    Auth,

    /// Transport-level failure: host unreachable, handshake error,
    /// channel refused, connection reset.
    #[error("SSH error: {0}")]
    Ssh(String),

    /// Writing to the process input failed (process exited, transport gone).
    #[error("write error: {0}")]
    Write(String),

    /// Reading from the process output failed mid-stream.
    #[error("read error: {0}")]
    Read(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<russh::Error> for ShellError {
    fn from(e: russh::Error) -> Self {
        ShellError::Ssh(e.to_string())
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ShellError>;
