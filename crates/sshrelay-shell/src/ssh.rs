//! russh-backed implementation of the remote-execution traits.
//!
//! Host keys are accepted unconditionally — the relay sits behind its own
//! channel authentication and targets are supplied per-connect by the
//! client, so there is no persistent known-hosts store to check against.

use crate::error::{Result, ShellError};
use crate::remote::{
    ExecOutput, InteractiveProcess, ProcessInput, ProcessOutput, PtyRequest, RemoteConnection,
    RemoteConnector,
};
use async_trait::async_trait;
use russh::client::{self, AuthResult};
use russh::keys::ssh_key;
use russh::{ChannelMsg, Disconnect};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

const DEFAULT_SSH_PORT: u16 = 22;

struct AcceptAllKeys;

impl client::Handler for AcceptAllKeys {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Connector for password-authenticated SSH sessions.
pub struct SshConnector {
    config: Arc<client::Config>,
}

impl SshConnector {
    pub fn new() -> Self {
        Self {
            config: Arc::new(client::Config::default()),
        }
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteConnector for SshConnector {
    async fn connect(
        &self,
        host: &str,
        username: &str,
        password: &str,
    ) -> Result<Box<dyn RemoteConnection>> {
        let (hostname, port) = split_host_port(host);
        debug!(host = %hostname, port, username, "opening SSH connection");

        let mut handle =
            client::connect(Arc::clone(&self.config), (hostname.as_str(), port), AcceptAllKeys)
                .await?;

        match handle.authenticate_password(username, password).await? {
            AuthResult::Success => {}
            AuthResult::Failure { .. } => return Err(ShellError::Auth),
        }

        Ok(Box::new(SshConnection { handle }))
    }
}

/// `host`, `host:port`, or bracketed `[v6addr]` / `[v6addr]:port`.
///
/// A bare IPv6 literal contains colons of its own, so a `:suffix` is only
/// treated as a port when the remainder has no other colon; everything else
/// passes through verbatim on port 22.
fn split_host_port(host: &str) -> (String, u16) {
    if let Some(rest) = host.strip_prefix('[') {
        if let Some((addr, suffix)) = rest.split_once(']') {
            if suffix.is_empty() {
                return (addr.to_string(), DEFAULT_SSH_PORT);
            }
            if let Some(Ok(port)) = suffix.strip_prefix(':').map(str::parse) {
                return (addr.to_string(), port);
            }
        }
        return (host.to_string(), DEFAULT_SSH_PORT);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.is_empty() && !name.contains(':') => match port.parse() {
            Ok(port) => (name.to_string(), port),
            Err(_) => (host.to_string(), DEFAULT_SSH_PORT),
        },
        _ => (host.to_string(), DEFAULT_SSH_PORT),
    }
}

struct SshConnection {
    handle: client::Handle<AcceptAllKeys>,
}

#[async_trait]
impl RemoteConnection for SshConnection {
    async fn spawn_interactive(&self, pty: &PtyRequest) -> Result<InteractiveProcess> {
        let channel = self.handle.channel_open_session().await?;
        channel
            .request_pty(false, &pty.term, pty.cols, pty.rows, 0, 0, &[])
            .await?;
        channel.request_shell(false).await?;

        let stream = channel.into_stream();
        let (read_half, write_half) = tokio::io::split(stream);

        Ok(InteractiveProcess {
            input: Box::new(StreamInput { writer: write_half }),
            output: Box::new(LineOutput {
                reader: BufReader::new(read_half),
                buf: String::new(),
            }),
        })
    }

    async fn run_once(&self, command: &str) -> Result<ExecOutput> {
        let mut channel = self.handle.channel_open_session().await?;
        channel.exec(true, command).await?;

        let mut stdout = Vec::new();
        let mut exit_status = 0u32;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status: code } => exit_status = code,
                _ => {}
            }
        }

        Ok(ExecOutput {
            exit_status,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
        })
    }

    async fn close(&self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "session closed", "en")
            .await?;
        Ok(())
    }
}

struct StreamInput<W> {
    writer: W,
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send + Sync> ProcessInput for StreamInput<W> {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer
            .write_all(bytes)
            .await
            .map_err(|e| ShellError::Write(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| ShellError::Write(e.to_string()))
    }
}

/// Line-buffered read half. `buf` persists across calls so a partial line
/// survives this future being dropped in a `select!` race.
struct LineOutput<R> {
    reader: BufReader<R>,
    buf: String,
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> ProcessOutput for LineOutput<R> {
    async fn next_line(&mut self) -> Result<Option<String>> {
        match self.reader.read_line(&mut self.buf).await {
            Ok(0) => {
                if self.buf.is_empty() {
                    Ok(None)
                } else {
                    // Final line had no terminator — yield it, then EOF.
                    Ok(Some(std::mem::take(&mut self.buf)))
                }
            }
            Ok(_) => {
                let mut line = std::mem::take(&mut self.buf);
                while line.ends_with('\n') || line.ends_with('\r') {
                    line.pop();
                }
                Ok(Some(line))
            }
            Err(e) => Err(ShellError::Read(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_without_port_gets_default() {
        assert_eq!(split_host_port("example.org"), ("example.org".to_string(), 22));
    }

    #[test]
    fn host_with_port_is_split() {
        assert_eq!(split_host_port("10.0.0.5:2222"), ("10.0.0.5".to_string(), 2222));
    }

    #[test]
    fn bad_port_falls_back_to_default() {
        assert_eq!(split_host_port("example.org:ssh"), ("example.org:ssh".to_string(), 22));
    }

    #[test]
    fn ipv6_literal_passes_through_unchanged() {
        assert_eq!(
            split_host_port("2001:db8::1"),
            ("2001:db8::1".to_string(), 22)
        );
    }

    #[test]
    fn bracketed_ipv6_with_port_is_split() {
        assert_eq!(
            split_host_port("[2001:db8::1]:2200"),
            ("2001:db8::1".to_string(), 2200)
        );
        assert_eq!(
            split_host_port("[2001:db8::1]"),
            ("2001:db8::1".to_string(), 22)
        );
    }

    #[tokio::test]
    async fn line_output_yields_lines_then_eof() {
        let data: &[u8] = b"one\r\ntwo\nthree";
        let mut out = LineOutput {
            reader: BufReader::new(data),
            buf: String::new(),
        };
        assert_eq!(out.next_line().await.unwrap(), Some("one".to_string()));
        assert_eq!(out.next_line().await.unwrap(), Some("two".to_string()));
        // unterminated final line is still delivered
        assert_eq!(out.next_line().await.unwrap(), Some("three".to_string()));
        assert_eq!(out.next_line().await.unwrap(), None);
    }
}
