//! `ShellHandle` — one authenticated connection plus the input half of one
//! interactive PTY process, owned exclusively by a single session.

use crate::error::Result;
use crate::remote::{ExecOutput, ProcessInput, RemoteConnection};
use std::time::Duration;
use tracing::debug;

/// Interrupt byte sent for STOP / CTRL_C.
pub const CTRL_C: u8 = 0x03;
/// End-of-transmission byte sent during teardown.
const CTRL_D: u8 = 0x04;
/// Delay between asking the shell to `exit` and forcing EOT.
const CLOSE_GRACE: Duration = Duration::from_millis(200);

pub struct ShellHandle {
    connection: Box<dyn RemoteConnection>,
    input: Box<dyn ProcessInput>,
    closed: bool,
}

impl ShellHandle {
    pub fn new(connection: Box<dyn RemoteConnection>, input: Box<dyn ProcessInput>) -> Self {
        Self {
            connection,
            input,
            closed: false,
        }
    }

    /// Write `command` followed by a newline to the process's stdin.
    pub async fn write_line(&mut self, command: &str) -> Result<()> {
        let mut bytes = command.as_bytes().to_vec();
        bytes.push(b'\n');
        self.input.write(&bytes).await
    }

    /// Send the interrupt byte (Ctrl-C) to the process.
    pub async fn interrupt(&mut self) -> Result<()> {
        self.input.write(&[CTRL_C]).await
    }

    /// Run a one-shot command on a separate channel of this connection.
    pub async fn run_once(&self, command: &str) -> Result<ExecOutput> {
        self.connection.run_once(command).await
    }

    /// Terminate the process and close the connection.
    ///
    /// Best-effort and idempotent: the process or connection may already be
    /// gone, so every step swallows its own failure. Sequence: ask the shell
    /// to `exit`, give it a short grace period, force EOT, close transport.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let _ = self.input.write(b"exit\n").await;
        tokio::time::sleep(CLOSE_GRACE).await;
        let _ = self.input.write(&[CTRL_D]).await;
        let _ = self.connection.close().await;
        debug!("shell handle closed");
    }
}
