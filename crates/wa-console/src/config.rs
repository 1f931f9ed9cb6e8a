//! Application configuration loaded from environment variables.

use crate::session::SessionSettings;
use anyhow::{Context, Result};
use bridge_client::BridgeClient;
use recipient_actions::{CoordinatorConfig, FileSlot, HandoffSlot, MemorySlot};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Bridge connection
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Media download limits
    #[serde(default)]
    pub media: MediaConfig,

    /// Console behaviour
    #[serde(default)]
    pub console: ConsoleConfig,
}

#[derive(Debug, Deserialize)]
pub struct BridgeConfig {
    /// Bridge REST API endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Basic auth user, when the bridge requires one
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<SecretString>,

    /// Device slot selected at startup
    #[serde(default)]
    pub device_id: Option<String>,

    /// Request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,

    /// Pause between two download dispatches
    #[serde(default = "default_dispatch_delay", with = "humantime_serde")]
    pub dispatch_delay: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// File backing the selected-chat handoff; kept in memory when unset
    #[serde(default)]
    pub handoff_path: Option<PathBuf>,

    /// Directory for CSV exports
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    #[serde(default = "default_chat_page_size")]
    pub chat_page_size: u64,

    #[serde(default = "default_message_page_size")]
    pub message_page_size: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: None,
            password: None,
            device_id: None,
            timeout: default_timeout(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: default_max_concurrent_downloads(),
            dispatch_delay: default_dispatch_delay(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            handoff_path: None,
            export_dir: default_export_dir(),
            chat_page_size: default_chat_page_size(),
            message_page_size: default_message_page_size(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".into()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_concurrent_downloads() -> usize {
    recipient_actions::media::DEFAULT_MAX_CONCURRENT_DOWNLOADS
}

fn default_dispatch_delay() -> Duration {
    recipient_actions::media::DEFAULT_DISPATCH_DELAY
}

fn default_log_level() -> String {
    "info".into()
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_chat_page_size() -> u64 {
    10
}

fn default_message_page_size() -> u64 {
    20
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Phone numbers and device ids must stay strings.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Client for the configured bridge, with basic auth when both halves are set.
    pub fn bridge_client(&self) -> Result<BridgeClient> {
        let client = BridgeClient::with_timeout(&self.bridge.base_url, self.bridge.timeout)
            .context("Failed to create bridge client")?;

        Ok(match (&self.bridge.username, &self.bridge.password) {
            (Some(user), Some(password)) => {
                client.with_basic_auth(user, password.expose_secret().clone())
            }
            _ => client,
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        let handoff: Arc<dyn HandoffSlot> = match &self.console.handoff_path {
            Some(path) => Arc::new(FileSlot::new(path)),
            None => Arc::new(MemorySlot::default()),
        };

        SessionSettings {
            initial_device: self.bridge.device_id.clone(),
            handoff,
            export_dir: self.console.export_dir.clone(),
            chat_page_size: self.console.chat_page_size,
            message_page_size: self.console.message_page_size,
            media: CoordinatorConfig {
                max_concurrent: self.media.max_concurrent_downloads,
                dispatch_delay: self.media.dispatch_delay,
            },
        }
    }
}
