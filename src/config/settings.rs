//! Configuration settings structure
//!
//! Defines the settings structure and loading logic for the session agent.
//! Precedence when loading: defaults, then the TOML file, then environment
//! variables; command line flags are applied on top by the binary.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::persist::FileSidStore;

/// Base URL the stock firmware answers on.
pub const DEFAULT_BASE_URL: &str = "http://192.168.0.1";

/// Main configuration settings for the session agent
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Device endpoint configuration
    pub device: DeviceSettings,
    /// Login credentials
    pub auth: AuthSettings,
    /// SID persistence configuration
    pub session: SessionSettings,
    /// Outbound network configuration
    pub network: NetworkSettings,
}

/// Device endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Device base URL
    pub base_url: String,
    /// Request timeout duration
    pub timeout: Duration,
}

/// Login credentials
///
/// `Debug` redacts the password so settings can be logged whole.
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthSettings {
    /// Admin interface username
    pub username: String,
    /// Admin interface password
    pub password: String,
}

/// SID persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// SID file path, `None` disables persistence
    pub sid_file: Option<PathBuf>,
}

/// Outbound network configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NetworkSettings {
    /// Proxy URL for all device traffic, e.g. `socks5://127.0.0.1:8080`
    /// to watch the exchange through mitmproxy
    pub proxy: Option<String>,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sid_file: FileSidStore::default_path().ok(),
        }
    }
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings with precedence order:
    /// 1. Environment variables (highest priority)
    /// 2. Configuration file
    /// 3. Default values (lowest priority)
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(path) = config_file {
            if path.exists() {
                info!("loading configuration from file: {:?}", path);
                settings = Self::from_file(path)?;
            } else {
                warn!("configuration file not found: {:?}, using defaults", path);
            }
        }

        debug!("applying environment variable overrides");
        let settings = settings.merge_with_env();

        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read config file {path:?}: {e}")))?;
        toml::from_str(&raw)
            .map_err(|e| Error::config(format!("cannot parse config file {path:?}: {e}")))
    }

    /// Fold environment variables over the current values.
    ///
    /// `CBN_SID_FILE` set to an empty string disables SID persistence
    /// entirely instead of pointing it at the default path.
    pub fn merge_with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("CBN_URL") {
            self.device.base_url = url;
        }
        if let Ok(username) = std::env::var("CBN_USR") {
            self.auth.username = username;
        }
        if let Ok(password) = std::env::var("CBN_PW") {
            self.auth.password = password;
        }
        if let Ok(path) = std::env::var("CBN_SID_FILE") {
            self.session.sid_file = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        if let Ok(proxy) = std::env::var("CBN_PROXY") {
            self.network.proxy = if proxy.is_empty() { None } else { Some(proxy) };
        }
        self
    }

    /// Device base URL as a parsed [`Url`].
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.device.base_url)
            .map_err(|e| Error::config(format!("invalid base URL {:?}: {e}", self.device.base_url)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::config(format!(
                "unsupported base URL scheme {other:?}, the device speaks http"
            ))),
        }
    }

    /// Check internal consistency of the final configuration.
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.device.timeout.is_zero() {
            return Err(Error::config("request timeout must be non-zero"));
        }
        if let Some(proxy) = &self.network.proxy {
            Url::parse(proxy)
                .map_err(|e| Error::config(format!("invalid proxy URL {proxy:?}: {e}")))?;
        }
        Ok(())
    }

    /// Fail unless both credentials are present.
    ///
    /// Called before a fresh login; a resume from a stored SID does not
    /// need credentials.
    pub fn require_credentials(&self) -> Result<()> {
        if self.auth.username.is_empty() {
            return Err(Error::config("no username configured, set CBN_USR or --username"));
        }
        if self.auth.password.is_empty() {
            return Err(Error::config("no password configured, set CBN_PW or --password"));
        }
        Ok(())
    }
}
