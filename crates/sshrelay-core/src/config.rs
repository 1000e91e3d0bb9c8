use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8722;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Hard cap per inbound WS text frame — anything larger is a fatal
/// protocol violation and closes the channel.
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;
/// Outbound message queue depth per session. The pump blocks (backpressure)
/// when the client reads slower than the remote shell produces output.
pub const OUTBOUND_QUEUE: usize = 64;

pub const DEFAULT_TERM: &str = "xterm";
pub const DEFAULT_COLS: u32 = 80;
pub const DEFAULT_ROWS: u32 = 24;

/// Top-level config (sshrelay.toml + SSHRELAY_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RelayConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub ssh: SshConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Geometry and terminal type for the interactive PTY spawned on CONNECT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    #[serde(default = "default_term")]
    pub term: String,
    #[serde(default = "default_cols")]
    pub cols: u32,
    #[serde(default = "default_rows")]
    pub rows: u32,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            term: DEFAULT_TERM.to_string(),
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_term() -> String {
    DEFAULT_TERM.to_string()
}
fn default_cols() -> u32 {
    DEFAULT_COLS
}
fn default_rows() -> u32 {
    DEFAULT_ROWS
}

impl RelayConfig {
    /// Load config from a TOML file with SSHRELAY_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.sshrelay/sshrelay.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: RelayConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("SSHRELAY_").split("_"))
            .extract()
            .map_err(|e| crate::error::RelayError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.sshrelay/sshrelay.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = RelayConfig::default();
        assert_eq!(config.gateway.port, DEFAULT_PORT);
        assert_eq!(config.gateway.bind, DEFAULT_BIND);
        assert_eq!(config.ssh.term, "xterm");
        assert_eq!(config.ssh.cols, 80);
        assert_eq!(config.ssh.rows, 24);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: RelayConfig = Figment::new()
            .merge(figment::providers::Toml::string("[gateway]\nport = 9000\n"))
            .extract()
            .unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.bind, DEFAULT_BIND);
        assert_eq!(config.ssh.term, "xterm");
    }
}
