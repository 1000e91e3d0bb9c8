//! Per-channel session state machine.
//!
//! One `Session` per WS connection, single-use:
//! `Unconnected → Connected → Closed`, no reconnect after close. The
//! session owns at most one [`ShellHandle`] and the pump task bound to it;
//! all mutation happens through the methods here.

use sshrelay_protocol::{Action, ActionMessage, Credentials, Outbound};
use sshrelay_shell::{pump, PtyRequest, RemoteConnector, ShellHandle};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connected,
    Closed,
}

pub struct Session {
    id: String,
    state: SessionState,
    handle: Option<ShellHandle>,
    pump: Option<JoinHandle<()>>,
    outbound: mpsc::Sender<Outbound>,
    connector: Arc<dyn RemoteConnector>,
    pty: PtyRequest,
}

impl Session {
    pub fn new(
        id: String,
        connector: Arc<dyn RemoteConnector>,
        pty: PtyRequest,
        outbound: mpsc::Sender<Outbound>,
    ) -> Self {
        Self {
            id,
            state: SessionState::Unconnected,
            handle: None,
            pump: None,
            outbound,
            connector,
            pty,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handle one inbound frame. Protocol errors (bad verb, missing field)
    /// are reported and the session carries on — only the caller's channel
    /// errors end a session.
    pub async fn dispatch(&mut self, message: ActionMessage) {
        debug!(session_id = %self.id, action = %message.action, "action received");
        match message.into_action() {
            Ok(Action::Connect(creds)) => self.connect(creds).await,
            Ok(Action::RunCommand(command)) => self.run_command(&command).await,
            Ok(Action::Interrupt) => self.interrupt().await,
            Ok(Action::ListFiles(directory)) => self.list_files(&directory).await,
            Err(e) => self.send(Outbound::error(e.to_string())).await,
        }
    }

    async fn connect(&mut self, creds: Credentials) {
        if self.state == SessionState::Connected {
            // Idempotent no-op: never replace a live handle.
            self.send(Outbound::info("Already connected.")).await;
            return;
        }

        let connection = match self
            .connector
            .connect(&creds.host, &creds.username, &creds.password)
            .await
        {
            Ok(connection) => connection,
            Err(e) => {
                // Auth failures are distinguishable so the client can
                // prompt for new credentials; both leave us Unconnected.
                warn!(session_id = %self.id, host = %creds.host, error = %e, "connect failed");
                self.send(Outbound::error(e.to_string())).await;
                return;
            }
        };

        let process = match connection.spawn_interactive(&self.pty).await {
            Ok(process) => process,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "shell spawn failed");
                let _ = connection.close().await;
                self.send(Outbound::error(e.to_string())).await;
                return;
            }
        };

        self.pump = Some(pump::spawn(process.output, self.outbound.clone()));
        self.handle = Some(ShellHandle::new(connection, process.input));
        self.state = SessionState::Connected;
        info!(session_id = %self.id, host = %creds.host, "interactive shell started");
        self.send(Outbound::info("Interactive Bash session started."))
            .await;
    }

    async fn run_command(&mut self, command: &str) {
        let Some(handle) = self.handle.as_mut() else {
            self.send(Outbound::error("Not connected.")).await;
            return;
        };
        // Fire and forget — output arrives asynchronously through the pump.
        if let Err(e) = handle.write_line(command).await {
            warn!(session_id = %self.id, error = %e, "command write failed");
            self.send(Outbound::error(e.to_string())).await;
        }
    }

    async fn interrupt(&mut self) {
        let Some(handle) = self.handle.as_mut() else {
            self.send(Outbound::error("Not connected.")).await;
            return;
        };
        match handle.interrupt().await {
            Ok(()) => {
                self.send(Outbound::info("Sent Ctrl+C to the remote process."))
                    .await
            }
            // The process already went away — informational, never an error.
            Err(_) => self.send(Outbound::info("Nothing to stop.")).await,
        }
    }

    /// One-shot `ls` on a separate exec channel; the interactive process's
    /// stdin is never involved. `directory` should be absolute — the exec
    /// channel starts in the login directory, not the shell's cwd.
    async fn list_files(&mut self, directory: &str) {
        let Some(handle) = self.handle.as_ref() else {
            self.send(Outbound::error("Not connected.")).await;
            return;
        };
        match handle.run_once(&format!("ls -1 {directory}")).await {
            Ok(output) if output.exit_status == 0 => {
                let entries = output
                    .stdout
                    .lines()
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect();
                self.send(Outbound::Directories(entries)).await;
            }
            Ok(output) => {
                self.send(Outbound::error(format!(
                    "ls exited with status {}",
                    output.exit_status
                )))
                .await;
            }
            Err(e) => self.send(Outbound::error(e.to_string())).await,
        }
    }

    /// Release everything this session owns. Safe to call more than once.
    ///
    /// Order matters: the pump is cancelled and awaited before the handle
    /// is closed, so a pump mid-write can never race a half-closed channel.
    pub async fn teardown(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;

        if let Some(pump) = self.pump.take() {
            pump.abort();
            // Cancellation is the normal path here, not a failure.
            let _ = pump.await;
        }
        if let Some(mut handle) = self.handle.take() {
            handle.close().await;
        }
        debug!(session_id = %self.id, "session torn down");
    }

    async fn send(&self, message: Outbound) {
        // A closed sink means the channel is already going away.
        let _ = self.outbound.send(message).await;
    }
}
