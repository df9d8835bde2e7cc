//! Configuration file support for the DX watcher.
//!
//! Settings load from a TOML file given on the command line, or from
//! `~/.config/dx-watch/config.toml` on Linux (platform-appropriate location
//! elsewhere). Configuration is loaded once at startup; a missing file,
//! malformed TOML, or failed validation is fatal.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};

use crate::client::{ClusterClientConfig, DEFAULT_PORT};
use crate::target::Target;

/// Recipient chat identifiers.
///
/// Deserializes from a single value or an array, and accepts integers as
/// well as strings, so all of these work:
/// - `chat_ids = "123456"`
/// - `chat_ids = 123456`
/// - `chat_ids = [123456, "@dx_alerts"]`
#[derive(Debug, Clone, Default)]
pub struct ChatIds(Vec<String>);

impl ChatIds {
    /// The recipient identifiers as strings.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Consume into the underlying list.
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// Check if no recipients are configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single chat id, numeric or textual.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChatIdValue {
    Num(i64),
    Text(String),
}

impl From<ChatIdValue> for String {
    fn from(value: ChatIdValue) -> Self {
        match value {
            ChatIdValue::Num(n) => n.to_string(),
            ChatIdValue::Text(s) => s,
        }
    }
}

impl<'de> Deserialize<'de> for ChatIds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ChatIdsVisitor;

        impl<'de> Visitor<'de> for ChatIdsVisitor {
            type Value = ChatIds;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a chat id or array of chat ids")
            }

            fn visit_str<E>(self, value: &str) -> Result<ChatIds, E>
            where
                E: de::Error,
            {
                Ok(ChatIds(vec![value.to_string()]))
            }

            fn visit_i64<E>(self, value: i64) -> Result<ChatIds, E>
            where
                E: de::Error,
            {
                Ok(ChatIds(vec![value.to_string()]))
            }

            fn visit_u64<E>(self, value: u64) -> Result<ChatIds, E>
            where
                E: de::Error,
            {
                Ok(ChatIds(vec![value.to_string()]))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<ChatIds, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut ids = Vec::new();
                while let Some(value) = seq.next_element::<ChatIdValue>()? {
                    ids.push(value.into());
                }
                Ok(ChatIds(ids))
            }
        }

        deserializer.deserialize_any(ChatIdsVisitor)
    }
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Hostname of the DX cluster node.
    pub host: String,

    /// Cluster port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Operator call sign used for the cluster login.
    #[serde(default = "default_callsign")]
    pub callsign: String,

    /// Telegram bot token.
    pub telegram_token: String,

    /// Telegram recipient chat ids.
    pub chat_ids: ChatIds,

    /// Suppression window for repeat notifications, in minutes.
    #[serde(default = "default_dedup_minutes")]
    pub dedup_minutes: u64,

    /// Watched station rules.
    pub targets: Vec<Target>,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Bound on each line read, in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64,

    /// Idle seconds before a keepalive command goes out.
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: u64,

    /// Idle seconds before the session is reconnected.
    #[serde(default = "default_watchdog_interval")]
    pub watchdog_interval: u64,

    /// Whether to automatically reconnect on disconnect.
    #[serde(default = "default_reconnect")]
    pub reconnect: bool,

    /// Fixed delay between reconnection attempts, in seconds.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay: u64,

    /// Print statistics every N seconds (0 disables).
    #[serde(default = "default_stats_interval")]
    pub stats_interval: u64,

    /// Enable Prometheus metrics HTTP endpoint.
    #[serde(default)]
    pub metrics_enabled: bool,

    /// Port for Prometheus metrics HTTP endpoint.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_callsign() -> String {
    "NOCALL".to_string()
}

fn default_dedup_minutes() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    60
}

fn default_read_timeout() -> u64 {
    60
}

fn default_keepalive_interval() -> u64 {
    600
}

fn default_watchdog_interval() -> u64 {
    900
}

fn default_reconnect() -> bool {
    true
}

fn default_reconnect_delay() -> u64 {
    10
}

fn default_stats_interval() -> u64 {
    300
}

fn default_metrics_port() -> u16 {
    9090
}

impl Config {
    /// Load configuration from the given path, or the default location.
    ///
    /// Unlike optional app settings, this file is required: the watcher
    /// cannot run without a cluster host, bot token, recipients, and
    /// targets.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path().context("could not determine config directory")?,
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid TOML in config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dx-watch/config.toml"))
    }

    /// Validate all configuration settings.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            bail!("host must not be empty");
        }
        if self.telegram_token.trim().is_empty() {
            bail!("telegram_token must not be empty");
        }
        if self.chat_ids.is_empty() {
            bail!("at least one chat id is required");
        }
        if self.targets.is_empty() {
            bail!("at least one target is required");
        }
        for (i, target) in self.targets.iter().enumerate() {
            target
                .validate()
                .map_err(|e| anyhow::anyhow!("invalid target [{}]: {}", i, e))?;
        }
        if self.watchdog_interval <= self.keepalive_interval {
            bail!("watchdog_interval must be longer than keepalive_interval");
        }
        Ok(())
    }

    /// Build the cluster client configuration.
    pub fn client_config(&self) -> ClusterClientConfig {
        ClusterClientConfig {
            host: self.host.clone(),
            port: self.port,
            callsign: self.callsign.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            read_timeout: Duration::from_secs(self.read_timeout),
            keepalive_after: Duration::from_secs(self.keepalive_interval),
            watchdog_after: Duration::from_secs(self.watchdog_interval),
            auto_reconnect: self.reconnect,
            reconnect_delay: Duration::from_secs(self.reconnect_delay),
        }
    }
}
