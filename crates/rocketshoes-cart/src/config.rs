//! # Cart Configuration
//!
//! Where the stock service lives, where the cart is stored, and how many
//! notifications a slow listener may fall behind by.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ROCKETSHOES_API_URL=http://localhost:3333                          │
//! │     ROCKETSHOES_DB_PATH=/tmp/cart.db                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/cart/cart.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.rocketshoes.cart/cart.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     local dev server on :3333, "@RocketShoes:cart"                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # cart.toml
//! [api]
//! base_url = "http://localhost:3333"
//! timeout_secs = 10
//!
//! [storage]
//! database_path = "/var/lib/rocketshoes/cart.db"  # optional
//! key = "@RocketShoes:cart"
//!
//! [notifications]
//! capacity = 64
//! ```

use directories::ProjectDirs;
use rocketshoes_core::DEFAULT_STORAGE_KEY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ConfigError, ConfigResult};

pub const ENV_API_URL: &str = "ROCKETSHOES_API_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "ROCKETSHOES_REQUEST_TIMEOUT_SECS";
pub const ENV_DB_PATH: &str = "ROCKETSHOES_DB_PATH";
pub const ENV_STORAGE_KEY: &str = "ROCKETSHOES_STORAGE_KEY";
pub const ENV_NOTIFICATION_CAPACITY: &str = "ROCKETSHOES_NOTIFICATION_CAPACITY";

const CONFIG_FILE_NAME: &str = "cart.toml";
const DATABASE_FILE_NAME: &str = "rocketshoes.db";

// =============================================================================
// Remote Service
// =============================================================================

/// Stock/product service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL; `/stock/{id}` and `/products/{id}` are appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout (seconds).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3333".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Local Storage
// =============================================================================

/// Persisted cart settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Key the cart is stored under.
    #[serde(default = "default_storage_key")]
    pub key: String,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            database_path: None,
            key: default_storage_key(),
        }
    }
}

impl StorageSettings {
    /// The configured database path, or `rocketshoes.db` in the platform
    /// data directory.
    pub fn resolved_database_path(&self) -> ConfigResult<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => project_dirs()
                .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
                .ok_or(ConfigError::NoConfigDir),
        }
    }
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Broadcast buffer. A listener further behind than this misses the
    /// oldest messages.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    64
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            capacity: default_capacity(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete cart configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl CartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`cart.toml`); a missing file is not an error
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading cart config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let url = Url::parse(&self.api.base_url).map_err(|e| {
            ConfigError::Invalid(format!("api.base_url '{}': {}", self.api.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }

        if self.storage.key.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.key must not be empty".into()));
        }

        if self.notifications.capacity == 0 {
            return Err(ConfigError::Invalid(
                "notifications.capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `ROCKETSHOES_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides from `lookup`, which maps a variable name to its
    /// value. Unparseable numbers are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL) {
            debug!(url = %url, "Overriding stock service URL from environment");
            self.api.base_url = url;
        }

        if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            match secs.parse::<u64>() {
                Ok(secs) => self.api.timeout_secs = secs,
                Err(_) => warn!(value = %secs, "Ignoring invalid {}", ENV_REQUEST_TIMEOUT_SECS),
            }
        }

        if let Some(path) = lookup(ENV_DB_PATH) {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(key) = lookup(ENV_STORAGE_KEY) {
            self.storage.key = key;
        }

        if let Some(capacity) = lookup(ENV_NOTIFICATION_CAPACITY) {
            match capacity.parse::<usize>() {
                Ok(capacity) => self.notifications.capacity = capacity,
                Err(_) => warn!(value = %capacity, "Ignoring invalid {}", ENV_NOTIFICATION_CAPACITY),
            }
        }
    }

    /// `cart.toml` in the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "rocketshoes", "cart")
}
