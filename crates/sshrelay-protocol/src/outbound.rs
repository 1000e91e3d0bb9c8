use serde::{Deserialize, Serialize};

/// Server → Client message. Externally tagged, so each variant serializes
/// as a single-key object:
///
/// ```text
/// {"info": "Interactive Bash session started."}
/// {"error": "Authentication failed."}
/// {"output": "line1\nline2"}
/// {"directories": ["a", "b"]}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outbound {
    /// Status or idempotent notice.
    Info(String),
    /// Recoverable or terminal problem description.
    Error(String),
    /// One sanitized, batched chunk of process output, newline-joined.
    Output(String),
    /// Result of LIST_FILES, in the remote command's own output order.
    Directories(Vec<String>),
}

impl Outbound {
    pub fn info(message: impl Into<String>) -> Self {
        Outbound::Info(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Outbound::Error(message.into())
    }
}
