//! Configuration management for UDP Joystick
//!
//! Handles loading, parsing, and hot-reloading of YAML configuration files.
//! Every section is optional; missing fields fall back to defaults.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::info;

pub use watcher::ConfigWatcher;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub heading: HeadingConfig,
    #[serde(default)]
    pub input: InputConfig,
}

/// Where and how heading messages are sent
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TransportConfig {
    #[serde(default = "default_transport_kind")]
    pub kind: TransportKind,
    /// Receiver address: `ip`, `ip:port`, or `host[:port]`
    #[serde(default = "default_destination")]
    pub destination: String,
    /// Port used when `destination` has none
    #[serde(default = "default_port")]
    pub default_port: u16,
}

/// Transport implementation
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Send datagrams over UDP
    Udp,
    /// Log messages only (dry run)
    Console,
}

/// Heading computation settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HeadingConfig {
    /// Magnitude at or below which the heading angle is not updated
    #[serde(default = "default_dead_zone")]
    pub dead_zone: f32,
}

/// Gamepad input settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct InputConfig {
    /// Flat width for axes whose driver reports none
    #[serde(default = "default_flat")]
    pub default_flat: f32,
    /// Sleep between gilrs polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: default_transport_kind(),
            destination: default_destination(),
            default_port: default_port(),
        }
    }
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            dead_zone: default_dead_zone(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            default_flat: default_flat(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to load config: {}", path))?;

        Ok(config)
    }

    /// Load configuration, or use defaults when the file does not exist
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path).await
        } else {
            info!("Config file {} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Parse and validate YAML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.transport.destination.trim().is_empty() {
            anyhow::bail!("transport.destination cannot be empty");
        }
        if self.transport.default_port == 0 {
            anyhow::bail!("transport.default_port must be non-zero");
        }

        let dead_zone = self.heading.dead_zone;
        if !(0.0..1.0).contains(&dead_zone) {
            anyhow::bail!("heading.dead_zone {} is invalid (must be in 0.0..1.0)", dead_zone);
        }

        let flat = self.input.default_flat;
        if !(0.0..1.0).contains(&flat) {
            anyhow::bail!("input.default_flat {} is invalid (must be in 0.0..1.0)", flat);
        }
        if self.input.poll_interval_ms == 0 {
            anyhow::bail!("input.poll_interval_ms must be at least 1");
        }

        Ok(())
    }
}

// Default value functions
fn default_transport_kind() -> TransportKind { TransportKind::Udp }
fn default_destination() -> String { "192.168.4.1".to_string() }
fn default_port() -> u16 { 4210 }
fn default_dead_zone() -> f32 { 0.1 }
fn default_flat() -> f32 { 0.05 }
fn default_poll_interval() -> u64 { 4 }
