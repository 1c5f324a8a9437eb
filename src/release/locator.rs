//! Compatible-asset selection.

use super::ReleaseAsset;
use crate::platform::Platform;
use crate::store::is_bare_file_name;
use tracing::debug;

/// Version token carried by rolling development builds.
pub const DEV_TOKEN: &str = "dev";

/// The `<product>-<version>.<extension>` naming convention for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetNaming {
    product: String,
    extension: &'static str,
}

impl AssetNaming {
    /// Naming for `product` artifacts built for `platform`.
    #[must_use]
    pub fn new(product: impl Into<String>, platform: Platform) -> Self {
        Self {
            product: product.into(),
            extension: platform.extension(),
        }
    }

    /// Extract the version part of `name`, or `None` if the name does not
    /// follow the convention for this product and platform.
    #[must_use]
    pub fn parse_version<'a>(&self, name: &'a str) -> Option<&'a str> {
        if !is_bare_file_name(name) {
            return None;
        }
        let rest = name.strip_prefix(self.product.as_str())?.strip_prefix('-')?;
        let version = rest.strip_suffix(self.extension)?.strip_suffix('.')?;
        (!version.is_empty()).then_some(version)
    }

    /// Artifact file name for `version`.
    #[must_use]
    pub fn filename(&self, version: &str) -> String {
        format!("{}-{version}.{}", self.product, self.extension)
    }

    /// Platform extension this naming matches.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.extension
    }
}

/// Select the asset compatible with `host_version`.
///
/// The first asset whose version equals `host_version` wins outright. Failing
/// that, dev-channel hosts fall back to the last `dev` asset listed. Stable
/// hosts never receive a dev build.
#[must_use]
pub fn select_asset<'a>(
    assets: &'a [ReleaseAsset],
    naming: &AssetNaming,
    host_version: &str,
    dev_channel: bool,
) -> Option<&'a ReleaseAsset> {
    let mut dev_candidate = None;

    for asset in assets {
        let Some(version) = naming.parse_version(&asset.name) else {
            continue;
        };

        if version == DEV_TOKEN {
            dev_candidate = Some(asset);
        } else if version == host_version {
            debug!("Exact match for host version {}: {}", host_version, asset.name);
            return Some(asset);
        }
    }

    if dev_channel {
        if let Some(asset) = dev_candidate {
            debug!("Falling back to dev-channel asset {}", asset.name);
        }
        dev_candidate
    } else {
        None
    }
}
