//! Hub HTTP configuration.

use reqwest::Url;
use serde::Deserialize;

use kiosk_bridge_domain::error::ValidationError;

/// Where and how state pushes reach the hub.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubHttpConfig {
    /// Base URL of the hub, e.g. `http://homeassistant.local:8123`.
    pub server_url: String,
    /// Long-lived access token. Falls back to the transport's token when unset.
    pub auth_token: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HubHttpConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8123".to_string(),
            auth_token: None,
            request_timeout_secs: 10,
        }
    }
}

impl HubHttpConfig {
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidServerUrl`] unless `server_url` is an
    /// absolute http(s) URL, or [`ValidationError::ZeroDuration`] for a zero
    /// timeout.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = || ValidationError::InvalidServerUrl(self.server_url.clone());
        let url = Url::parse(&self.server_url).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
            return Err(invalid());
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::ZeroDuration("request_timeout_secs"));
        }
        Ok(())
    }

    /// Server URL without a trailing slash, ready to prefix hub paths.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}
