//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `kiosk-bridge.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use kiosk_bridge_adapter_hub_http::HubHttpConfig;
use kiosk_bridge_adapter_virtual::VirtualDeviceConfig;
use kiosk_bridge_app::bridge::BridgeSettings;
use kiosk_bridge_app::timings::Timings;
use kiosk_bridge_domain::binding::EntityBindings;
use kiosk_bridge_domain::error::ValidationError;

const CONFIG_FILE: &str = "kiosk-bridge.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hub REST endpoint and credentials.
    pub hub: HubHttpConfig,
    /// Hub entities the kiosk reports to.
    pub entities: EntityBindings,
    /// Room presence settings.
    pub presence: PresenceConfig,
    /// Throttle and timer settings.
    pub timings: TimingsConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Simulated kiosk settings.
    pub device: VirtualDeviceConfig,
}

/// Room presence configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Room reported for beacon sightings; presence is off when unset.
    pub location_name: Option<String>,
    /// Age in seconds after which a beacon sighting is forgotten.
    pub beacon_ttl_secs: u64,
}

/// Throttle and timer configuration, in seconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingsConfig {
    pub throttle_window_secs: u64,
    pub motion_active_revert_secs: u64,
    pub motion_idle_revert_secs: u64,
    pub subscribe_retry_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `kiosk-bridge.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(CONFIG_FILE)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(val) = env("KIOSK_BRIDGE_SERVER_URL") {
            self.hub.server_url = val;
        }
        if let Some(val) = env("KIOSK_BRIDGE_TOKEN") {
            self.hub.auth_token = Some(val);
        }
        if let Some(val) = env("KIOSK_BRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = env("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.hub.validate()?;
        self.entities.validate()?;
        self.timings().validate()?;
        Ok(())
    }

    /// Timer settings as durations.
    #[must_use]
    pub fn timings(&self) -> Timings {
        Timings {
            throttle_window: Duration::from_secs(self.timings.throttle_window_secs),
            motion_active_revert: Duration::from_secs(self.timings.motion_active_revert_secs),
            motion_idle_revert: Duration::from_secs(self.timings.motion_idle_revert_secs),
            subscribe_retry: Duration::from_secs(self.timings.subscribe_retry_secs),
            beacon_ttl: Duration::from_secs(self.presence.beacon_ttl_secs),
        }
    }

    /// Settings handed to the bridge at startup.
    #[must_use]
    pub fn bridge_settings(&self) -> BridgeSettings {
        BridgeSettings {
            bindings: self.entities.clone(),
            location_name: self.presence.location_name.clone(),
            timings: self.timings(),
        }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            location_name: None,
            beacon_ttl_secs: 3600,
        }
    }
}

impl Default for TimingsConfig {
    fn default() -> Self {
        Self {
            throttle_window_secs: 10,
            motion_active_revert_secs: 5,
            motion_idle_revert_secs: 10,
            subscribe_retry_secs: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn,kiosk_bridge=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration")]
    Validation(#[from] ValidationError),
}
