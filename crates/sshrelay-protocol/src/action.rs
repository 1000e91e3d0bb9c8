use serde::Deserialize;
use thiserror::Error;

/// Raw inbound frame — deserialized first, then refined into an [`Action`].
///
/// Parsing happens in two steps so the caller can tell a malformed frame
/// (fatal: the channel is closed) apart from a well-formed frame with a bad
/// or incomplete action (recoverable: reported as an `error` message).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionMessage {
    #[serde(default)]
    pub action: String,
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub command: Option<String>,
    pub directory: Option<String>,
}

/// Credentials carried by a CONNECT action.
#[derive(Clone)]
pub struct Credentials {
    pub host: String,
    pub username: String,
    pub password: String,
}

// Passwords must never reach the logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A validated inbound instruction.
#[derive(Debug, Clone)]
pub enum Action {
    Connect(Credentials),
    RunCommand(String),
    /// STOP and CTRL_C on the wire — both send an interrupt (0x03) to the
    /// interactive process.
    Interrupt,
    ListFiles(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Unknown action: {0}")]
    Unknown(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

impl ActionMessage {
    /// Refine the raw frame into a typed [`Action`].
    ///
    /// The verb is matched case-insensitively after trimming. Required
    /// fields must be present and non-empty.
    pub fn into_action(self) -> Result<Action, ActionError> {
        let verb = self.action.trim().to_ascii_uppercase();
        match verb.as_str() {
            "CONNECT" => Ok(Action::Connect(Credentials {
                host: require(self.host, "host")?,
                username: require(self.username, "username")?,
                password: require(self.password, "password")?,
            })),
            "RUN_COMMAND" => Ok(Action::RunCommand(require(self.command, "command")?)),
            "STOP" | "CTRL_C" => Ok(Action::Interrupt),
            "LIST_FILES" => Ok(Action::ListFiles(require(self.directory, "directory")?)),
            _ => Err(ActionError::Unknown(self.action.trim().to_string())),
        }
    }
}

fn require(field: Option<String>, name: &'static str) -> Result<String, ActionError> {
    match field {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ActionError::MissingField(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_is_case_insensitive_and_trimmed() {
        let msg = ActionMessage {
            action: "  stop ".to_string(),
            ..Default::default()
        };
        assert!(matches!(msg.into_action(), Ok(Action::Interrupt)));
    }

    #[test]
    fn connect_requires_all_credentials() {
        let msg = ActionMessage {
            action: "CONNECT".to_string(),
            host: Some("h".to_string()),
            username: Some("u".to_string()),
            ..Default::default()
        };
        assert_eq!(
            msg.into_action().unwrap_err(),
            ActionError::MissingField("password")
        );
    }

    #[test]
    fn empty_field_counts_as_missing() {
        let msg = ActionMessage {
            action: "RUN_COMMAND".to_string(),
            command: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            msg.into_action().unwrap_err(),
            ActionError::MissingField("command")
        );
    }

    #[test]
    fn unknown_action_is_reported_verbatim() {
        let msg = ActionMessage {
            action: "reboot".to_string(),
            ..Default::default()
        };
        assert_eq!(
            msg.into_action().unwrap_err(),
            ActionError::Unknown("reboot".to_string())
        );
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials {
            host: "h".to_string(),
            username: "u".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
