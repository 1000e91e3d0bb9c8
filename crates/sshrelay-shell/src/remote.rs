//! Trait seams between the session logic and the remote-execution transport.
//!
//! The session and pump only ever see these traits; the russh backend lives
//! in [`crate::ssh`] and tests substitute scripted fakes.

use crate::error::Result;
use async_trait::async_trait;

/// Terminal type and geometry requested for the interactive process.
#[derive(Debug, Clone)]
pub struct PtyRequest {
    pub term: String,
    pub cols: u32,
    pub rows: u32,
}

impl Default for PtyRequest {
    fn default() -> Self {
        Self {
            term: "xterm".to_string(),
            cols: 80,
            rows: 24,
        }
    }
}

/// Result of a one-shot remote command.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_status: u32,
    pub stdout: String,
}

/// Write half of an interactive process — owned by the session.
///
/// `Sync` is required because the owning session is borrowed across awaits
/// inside a spawned task.
#[async_trait]
pub trait ProcessInput: Send + Sync {
    /// Write raw bytes to the process's stdin and flush.
    async fn write(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Read half of an interactive process — owned by the output pump.
#[async_trait]
pub trait ProcessOutput: Send {
    /// Next line of output, without its trailing newline.
    ///
    /// `Ok(None)` is the end-of-stream sentinel (process exited, channel
    /// drained); `Err` is reserved for genuine read faults. Implementations
    /// must keep any partial line buffered across calls so that a caller
    /// racing this future in `select!` never loses data.
    async fn next_line(&mut self) -> Result<Option<String>>;
}

/// An interactive PTY process, split into its two independently-owned halves.
pub struct InteractiveProcess {
    pub input: Box<dyn ProcessInput>,
    pub output: Box<dyn ProcessOutput>,
}

/// One authenticated connection to a target host.
#[async_trait]
pub trait RemoteConnection: Send + Sync {
    /// Spawn the login shell in a PTY and return its split halves.
    async fn spawn_interactive(&self, pty: &PtyRequest) -> Result<InteractiveProcess>;

    /// Run a one-shot command on a separate exec channel. Never touches the
    /// interactive process's stdin.
    async fn run_once(&self, command: &str) -> Result<ExecOutput>;

    /// Close the underlying transport. Invalidates any process spawned on
    /// this connection.
    async fn close(&self) -> Result<()>;
}

/// Factory for authenticated connections.
#[async_trait]
pub trait RemoteConnector: Send + Sync {
    /// Open a transport connection to `host` and authenticate as
    /// `username` with `password`.
    ///
    /// Fails with [`crate::ShellError::Auth`] when the host rejects the
    /// credentials, and [`crate::ShellError::Ssh`] for anything else.
    async fn connect(
        &self,
        host: &str,
        username: &str,
        password: &str,
    ) -> Result<Box<dyn RemoteConnection>>;
}
