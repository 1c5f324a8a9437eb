//! Command-line interface definition.

use clap::Parser;
use native_updater::UpdaterConfig;
use std::path::PathBuf;

/// Keep a host application's native plugin binary in sync with its latest release.
#[derive(Parser, Debug)]
#[command(name = "native-updater")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Version string reported by the host application (e.g. "4.1.5747-dev").
    #[arg(long, env = "NATIVE_UPDATER_HOST_VERSION")]
    pub host_version: String,

    /// Host plugin directory the artifact is installed into.
    #[arg(long, env = "NATIVE_UPDATER_INSTALL_DIR")]
    pub install_dir: Option<PathBuf>,

    /// Artifact filename base.
    #[arg(long, env = "NATIVE_UPDATER_PRODUCT_NAME")]
    pub product_name: Option<String>,

    /// Plugin identifier used for the record file and notifications.
    #[arg(long, env = "NATIVE_UPDATER_PLUGIN_NAME")]
    pub plugin_name: Option<String>,

    /// GitHub repository in owner/repo form.
    #[arg(long, env = "NATIVE_UPDATER_REPOSITORY")]
    pub repository: Option<String>,

    /// Base URL of the releases API.
    #[arg(long, env = "NATIVE_UPDATER_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Host application name used in messages.
    #[arg(long, env = "NATIVE_UPDATER_HOST_NAME")]
    pub host_name: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "NATIVE_UPDATER_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Attempts per request, including the first.
    #[arg(long, env = "NATIVE_UPDATER_MAX_ATTEMPTS")]
    pub max_attempts: Option<u32>,

    /// Log level.
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Emit logs as JSON.
    #[arg(long)]
    pub json_logs: bool,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Merge CLI arguments over the configuration file (or defaults).
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded.
    pub fn to_config(&self) -> color_eyre::Result<UpdaterConfig> {
        let mut config = if let Some(ref path) = self.config {
            UpdaterConfig::from_file(path)?
        } else {
            UpdaterConfig::default()
        };

        if let Some(ref dir) = self.install_dir {
            config.install_dir.clone_from(dir);
        }
        if let Some(ref name) = self.product_name {
            config.product_name.clone_from(name);
        }
        if let Some(ref name) = self.plugin_name {
            config.plugin_name.clone_from(name);
        }
        if let Some(ref repo) = self.repository {
            config.repository.clone_from(repo);
        }
        if let Some(ref url) = self.api_base_url {
            config.api_base_url.clone_from(url);
        }
        if let Some(ref name) = self.host_name {
            config.host_name.clone_from(name);
        }
        if let Some(secs) = self.timeout_secs {
            config.http.timeout_secs = secs;
        }
        if let Some(attempts) = self.max_attempts {
            config.http.max_attempts = attempts;
        }
        config.log_level.clone_from(&self.log_level);

        Ok(config)
    }
}
