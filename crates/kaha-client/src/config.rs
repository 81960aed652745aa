//! # Client Configuration
//!
//! Configuration for a single register terminal.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KAHA_API_BASE_URL=http://192.168.1.10:8000                         │
//! │     KAHA_REQUEST_TIMEOUT_SECS=15                                       │
//! │     KAHA_LOCAL_PREFIX=LOCAL                                            │
//! │     KAHA_STORE_NAME="Sari-Sari ni Aling Nena"                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/kaha-pos/kaha.toml (Linux)                               │
//! │     ~/Library/Application Support/com.kaha.pos/kaha.toml (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:8000, 30s timeout, Cash                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # kaha.toml
//! [api]
//! base_url = "http://192.168.1.10:8000"
//! timeout_secs = 15
//!
//! [terminal]
//! store_name = "Main Branch"
//! local_number_prefix = "LOCAL"
//! default_payment_method = "Cash"
//! default_category = 3
//! ```

use std::path::PathBuf;
use std::time::Duration;

use kaha_core::{OrderMode, PaymentMethod, LOCAL_NUMBER_PREFIX};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// API Settings
// =============================================================================

/// Where the POS backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL; endpoint paths (`/api/...`) are joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// =============================================================================
// Terminal Settings
// =============================================================================

/// Per-register preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalSettings {
    /// Printed on receipts.
    #[serde(default = "default_store_name")]
    pub store_name: String,

    /// Prefix for transaction numbers made up when the issuer is down.
    #[serde(default = "default_local_prefix")]
    pub local_number_prefix: String,

    /// Payment method a fresh draft starts with.
    #[serde(default)]
    pub default_payment_method: PaymentMethod,

    /// Category the product grid opens on; `None` shows everything.
    #[serde(default)]
    pub default_category: Option<i64>,
}

fn default_store_name() -> String {
    "Kaha POS".to_string()
}

fn default_local_prefix() -> String {
    LOCAL_NUMBER_PREFIX.to_string()
}

impl Default for TerminalSettings {
    fn default() -> Self {
        TerminalSettings {
            store_name: default_store_name(),
            local_number_prefix: default_local_prefix(),
            default_payment_method: PaymentMethod::default(),
            default_category: None,
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete terminal configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend connection.
    #[serde(default)]
    pub api: ApiSettings,

    /// Register preferences.
    #[serde(default)]
    pub terminal: TerminalSettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (kaha.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(self.api.base_url.trim())?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidConfig(format!(
                "API base URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        let prefix = self.terminal.local_number_prefix.trim();
        if prefix.is_empty() || prefix.contains(char::is_whitespace) || prefix.contains('-') {
            return Err(ClientError::InvalidConfig(format!(
                "local_number_prefix must be a single word without '-', got: '{}'",
                self.terminal.local_number_prefix
            )));
        }

        if !self.terminal.default_payment_method.allowed_in(OrderMode::New) {
            return Err(ClientError::InvalidConfig(format!(
                "{} cannot be the default payment method for new sales",
                self.terminal.default_payment_method
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("KAHA_API_BASE_URL") {
            debug!(url = %url, "Overriding API base URL from environment");
            self.api.base_url = url;
        }

        if let Ok(timeout) = std::env::var("KAHA_REQUEST_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.api.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring non-numeric KAHA_REQUEST_TIMEOUT_SECS"),
            }
        }

        if let Ok(prefix) = std::env::var("KAHA_LOCAL_PREFIX") {
            debug!(prefix = %prefix, "Overriding local number prefix from environment");
            self.terminal.local_number_prefix = prefix;
        }

        if let Ok(name) = std::env::var("KAHA_STORE_NAME") {
            self.terminal.store_name = name;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "kaha", "pos")
            .map(|dirs| dirs.config_dir().join("kaha.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn base_url(&self) -> &str {
        self.api.base_url.trim()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn local_number_prefix(&self) -> &str {
        self.terminal.local_number_prefix.trim()
    }
}
