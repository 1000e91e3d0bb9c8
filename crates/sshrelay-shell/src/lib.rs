//! sshrelay-shell — the remote-shell layer of the relay.
//!
//! One authenticated SSH connection plus one interactive PTY process per
//! session, behind narrow trait seams so the session logic never touches
//! the transport directly:
//!
//! - [`remote`]: `RemoteConnector` / `RemoteConnection` / process-half traits
//! - [`ssh`]: the russh-backed implementation of those traits
//! - [`handle`]: `ShellHandle` — write-line / interrupt / idempotent close
//! - [`pump`]: background task draining process output into sanitized,
//!   batched outbound messages
//! - [`sanitize`]: pure per-line output cleanup

pub mod error;
pub mod handle;
pub mod pump;
pub mod remote;
pub mod sanitize;
pub mod ssh;

pub use error::{Result, ShellError};
pub use handle::ShellHandle;
pub use remote::{
    ExecOutput, InteractiveProcess, ProcessInput, ProcessOutput, PtyRequest, RemoteConnection,
    RemoteConnector,
};
pub use ssh::SshConnector;
