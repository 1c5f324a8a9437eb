//! Release feed access and compatible-asset selection.
//!
//! This module handles:
//! - The release payload shape (`tag_name` plus downloadable assets)
//! - Picking the one asset built for this host version and platform
//! - Fetching metadata and asset bytes over HTTP

mod http;
mod locator;

pub use http::HttpReleaseClient;
pub use locator::{select_asset, AssetNaming, DEV_TOKEN};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;

/// The latest release as published on the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// Release identifier, recorded as the installed version.
    pub tag_name: String,
    /// Downloadable files attached to the release, in feed order.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// File name, `<product>-<version|dev>.<extension>`.
    pub name: String,
    /// Where the bytes can be fetched from.
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

impl ReleaseAsset {
    /// Create an asset entry.
    #[must_use]
    pub fn new(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            download_url: download_url.into(),
        }
    }
}

/// Network collaborator used by the reconciler.
///
/// Implementations must report every failure (unreachable host, non-2xx,
/// timeout, truncated body) as [`crate::Error::Transport`].
pub trait ReleaseClient: Send + Sync {
    /// Fetch the latest release metadata.
    fn latest_release(&self) -> impl Future<Output = Result<ReleaseInfo>> + Send;

    /// Download `url` to `dest`, replacing any existing file.
    ///
    /// `dest` must never be left holding a partial body.
    fn download(&self, url: &str, dest: &Path) -> impl Future<Output = Result<()>> + Send;
}
