//! Configuration for native-updater.

use crate::store::StoreLayout;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Updater configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Plugin identifier; names the record file and titles notifications.
    #[serde(default = "default_plugin_name")]
    pub plugin_name: String,

    /// Artifact filename base (`<product_name>-<version>.<ext>`).
    #[serde(default = "default_product_name")]
    pub product_name: String,

    /// GitHub repository in `owner/repo` form.
    #[serde(default = "default_repository")]
    pub repository: String,

    /// Base URL of the releases API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Host plugin directory the artifact is installed into.
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,

    /// Name of the tracking record directory inside `install_dir`.
    #[serde(default = "default_record_dir_name")]
    pub record_dir_name: String,

    /// Name of the staging directory inside `install_dir`.
    #[serde(default = "default_staging_dir_name")]
    pub staging_dir_name: String,

    /// Host application name used in user-facing messages.
    #[serde(default = "default_host_name")]
    pub host_name: String,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// HTTP client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Total timeout per request in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Attempts per request including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds, doubled on each retry.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// User-Agent header (required by the GitHub API).
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            plugin_name: default_plugin_name(),
            product_name: default_product_name(),
            repository: default_repository(),
            api_base_url: default_api_base_url(),
            install_dir: default_install_dir(),
            record_dir_name: default_record_dir_name(),
            staging_dir_name: default_staging_dir_name(),
            host_name: default_host_name(),
            http: HttpConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_plugin_name() -> String {
    "native-predicate-solver".to_string()
}

fn default_product_name() -> String {
    "NativePredicateSolver".to_string()
}

fn default_repository() -> String {
    "ScriptWare-Software/native-predicate-solver".to_string()
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_install_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "binaryninja")
        .map(|dirs| dirs.data_dir().join("plugins"))
        .unwrap_or_else(|| PathBuf::from("plugins"))
}

fn default_record_dir_name() -> String {
    "native_plugins_data".to_string()
}

fn default_staging_dir_name() -> String {
    "temp".to_string()
}

fn default_host_name() -> String {
    "the host application".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_timeout_secs() -> u64 {
    300
}

const fn default_connect_timeout_secs() -> u64 {
    30
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    format!("native-updater/{}", env!("CARGO_PKG_VERSION"))
}

impl UpdaterConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// URL of the latest-release endpoint.
    #[must_use]
    pub fn feed_url(&self) -> String {
        format!(
            "{}/repos/{}/releases/latest",
            self.api_base_url.trim_end_matches('/'),
            self.repository
        )
    }

    /// Title prefixed to every user notification.
    #[must_use]
    pub fn notification_title(&self) -> String {
        format!("{} (Native plugin loader)", self.plugin_name)
    }

    /// Directory layout derived from this configuration.
    #[must_use]
    pub fn layout(&self) -> StoreLayout {
        StoreLayout::new(
            self.install_dir.clone(),
            &self.record_dir_name,
            &self.staging_dir_name,
            &self.plugin_name,
        )
    }
}
