//! Error types for native-updater.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can end an update check.
#[derive(Debug, Error)]
pub enum Error {
    /// The release feed or a download could not be reached or returned garbage.
    #[error("transport error: {0}")]
    Transport(String),

    /// The compatible asset could not be downloaded.
    #[error("failed to download {url}")]
    Download {
        /// Asset download URL.
        url: String,
    },

    /// The current operating system has no artifact flavour.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// The release carries no artifact for this host version.
    #[error("no compatible binary found for host version {host_version}")]
    NoCompatibleAsset {
        /// Version string reported by the host.
        host_version: String,
    },

    /// The tracking record exists but cannot be trusted.
    #[error("corrupt tracking record {}: {reason}", path.display())]
    CorruptRecord {
        /// Path of the record file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// A path that had to be removed is still there.
    #[error("failed to delete {}", path.display())]
    CleanupFailure {
        /// The path that could not be removed.
        path: PathBuf,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the user has to fix the installation by hand before the next
    /// check can make progress.
    #[must_use]
    pub fn is_manual_intervention(&self) -> bool {
        matches!(self, Self::CleanupFailure { .. })
    }

    /// Render the message shown to the user for this error.
    #[must_use]
    pub fn user_message(&self, host_name: &str) -> String {
        match self {
            Self::Transport(detail) => format!("Failed to fetch release information ({detail})"),
            Self::Download { url } => format!("Failed to download plugin from {url}"),
            Self::UnsupportedPlatform(_) => "Unsupported platform".to_string(),
            Self::NoCompatibleAsset { host_version } => {
                format!("No compatible binary found for {host_name} version {host_version}")
            }
            Self::CleanupFailure { path } => format!(
                "Failed to delete {}, please close {host_name} and delete the file/folder manually",
                path.display()
            ),
            other => other.to_string(),
        }
    }
}
