//! Application configuration.
//!
//! Loaded once at startup from a TOML file and passed into each component
//! as an immutable struct. Credentials and endpoints have no defaults: a
//! missing required field is a startup error, not a silent fallback.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Mailbox connection and folder settings.
    pub imap: ImapConfig,
    /// Which sender to relay.
    pub filter: FilterConfig,
    /// Webhook endpoint and signing secret.
    pub webhook: WebhookConfig,
    /// Poll cadence.
    #[serde(default)]
    pub poll: PollConfig,
    /// Log sinks and verbosity.
    #[serde(default)]
    pub log: LogConfig,
}

/// IMAP server settings. The port default is the implicit-TLS port.
#[derive(Debug, Clone, Deserialize)]
pub struct ImapConfig {
    pub host: String,
    #[serde(default = "default_imap_port")]
    pub port: u16,
    pub username: String,
    /// Account password or app-specific authorization token.
    pub password: String,
    #[serde(default = "default_folder")]
    pub folder: String,
}

/// Sender filter settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Only messages whose From address equals this (case-insensitive,
    /// after reducing the header to its bare address) are relayed.
    pub sender: String,
}

/// Webhook settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Base URL of the chat robot webhook, including any access token.
    pub url: String,
    /// Signing secret for the timestamp+sign query parameters. Leave empty
    /// if the robot has no signature requirement.
    #[serde(default)]
    pub secret: String,
}

/// Poll cadence settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Target wall-clock seconds between cycle starts.
    pub interval_secs: u64,
}

/// Log settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: String,
    /// Directory for the daily-rotated log file.
    pub directory: PathBuf,
}

fn default_imap_port() -> u16 {
    993
}

fn default_folder() -> String {
    "INBOX".to_string()
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use indoc::indoc;

    const FULL: &str = indoc! {r#"
        [imap]
        host = "imap.example.com"
        port = 143
        username = "robot@example.com"
        password = "hunter2"
        folder = "Notifications"

        [filter]
        sender = "system@notice.example.com"

        [webhook]
        url = "https://chat.example.com/robot/send?access_token=abc"
        secret = "SEC000"

        [poll]
        interval_secs = 30

        [log]
        level = "debug"
        directory = "/var/log/mailpush"
    "#};

    const MINIMAL: &str = indoc! {r#"
        [imap]
        host = "imap.example.com"
        username = "robot@example.com"
        password = "hunter2"

        [filter]
        sender = "system@notice.example.com"

        [webhook]
        url = "https://chat.example.com/robot/send?access_token=abc"
    "#};

    #[test]
    fn full_config_parses() {
        let config: Config = toml::from_str(FULL).expect("full config parses");
        assert_eq!(config.imap.port, 143);
        assert_eq!(config.imap.folder, "Notifications");
        assert_eq!(config.webhook.secret, "SEC000");
        assert_eq!(config.poll.interval_secs, 30);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn minimal_config_applies_defaults() {
        let config: Config = toml::from_str(MINIMAL).expect("minimal config parses");
        assert_eq!(config.imap.port, 993);
        assert_eq!(config.imap.folder, "INBOX");
        assert_eq!(config.webhook.secret, "");
        assert_eq!(config.poll.interval_secs, 10);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.directory.to_str(), Some("logs"));
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let without_password = MINIMAL.replace("password = \"hunter2\"\n", "");
        assert!(toml::from_str::<Config>(&without_password).is_err());
    }
}
