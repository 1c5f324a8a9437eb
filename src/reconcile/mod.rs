//! Reconciliation of the installed artifact against the latest release.
//!
//! Each pass is re-derived from the filesystem and the tracking record; no
//! state is carried between passes. A pass ends in exactly one [`Outcome`] or
//! an [`Error`]. Any deletion the pass depends on that fails stops it with
//! [`Error::CleanupFailure`].

mod decision;

pub use decision::{plan, resolve_comparison, Comparison, Observation, Plan};

use crate::error::{Error, Result};
use crate::hasher::{ContentHasher, Sha256Hasher};
use crate::platform::HostVersion;
use crate::release::{select_asset, AssetNaming, ReleaseAsset, ReleaseClient};
use crate::store::{ArtifactStore, TrackingRecord};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Terminal result of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was installed; the release was downloaded and registered.
    Installed {
        /// Release tag that was installed.
        version: String,
        /// Installed file name.
        filename: String,
    },
    /// The installed file already equals the latest release and was registered.
    Adopted {
        /// Release tag recorded for the file.
        version: String,
        /// Adopted file name.
        filename: String,
    },
    /// Record and file agree with the latest release.
    UpToDate {
        /// Release tag in the record.
        version: String,
    },
    /// Automatic replacement would be unsafe; the user has to update.
    ManualUpdateRequired {
        /// Where the latest artifact can be downloaded.
        download_url: String,
        /// Directory the user must place it in.
        install_dir: PathBuf,
    },
}

impl Outcome {
    /// Message for the user, if this outcome warrants one.
    #[must_use]
    pub fn notice(&self, host_name: &str) -> Option<String> {
        match self {
            Self::Installed { .. } => Some(format!(
                "Plugin downloaded successfully, please restart {host_name} to load it"
            )),
            Self::ManualUpdateRequired {
                download_url,
                install_dir,
            } => Some(format!(
                "You are using outdated version of this plugin and it must be updated manually\n\
                 1. download the latest version from {download_url}\n\
                 2. close {host_name}\n\
                 3. replace the outdated plugin with the newly downloaded file in {}",
                install_dir.display()
            )),
            Self::Adopted { .. } | Self::UpToDate { .. } => None,
        }
    }
}

/// Drives one artifact through the reconciliation decision table.
pub struct Reconciler<C, H = Sha256Hasher> {
    client: C,
    store: ArtifactStore,
    hasher: H,
    naming: AssetNaming,
    host: HostVersion,
}

impl<C: ReleaseClient> Reconciler<C> {
    /// Create a reconciler hashing with SHA-256.
    #[must_use]
    pub fn new(client: C, store: ArtifactStore, naming: AssetNaming, host: HostVersion) -> Self {
        Self::with_hasher(client, store, Sha256Hasher, naming, host)
    }
}

impl<C: ReleaseClient, H: ContentHasher> Reconciler<C, H> {
    /// Create a reconciler with a custom content hasher.
    #[must_use]
    pub fn with_hasher(
        client: C,
        store: ArtifactStore,
        hasher: H,
        naming: AssetNaming,
        host: HostVersion,
    ) -> Self {
        Self {
            client,
            store,
            hasher,
            naming,
            host,
        }
    }

    /// The store this reconciler mutates.
    #[must_use]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The host version assets are matched against.
    #[must_use]
    pub fn host(&self) -> &HostVersion {
        &self.host
    }

    /// Query the feed, locate the compatible asset and reconcile against it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the feed cannot be read,
    /// [`Error::Download`] if the asset cannot be downloaded,
    /// [`Error::NoCompatibleAsset`] if the release has no artifact for this
    /// host, and [`Error::CleanupFailure`] if a required deletion fails.
    pub async fn run(&self) -> Result<Outcome> {
        let release = self.client.latest_release().await?;

        let asset = select_asset(
            &release.assets,
            &self.naming,
            self.host.core(),
            self.host.is_dev_channel(),
        )
        .ok_or_else(|| Error::NoCompatibleAsset {
            host_version: self.host.display().to_string(),
        })?;

        info!(
            "Latest release {} provides {} for host {}",
            release.tag_name, asset.name, self.host
        );
        self.reconcile(&release.tag_name, asset).await
    }

    /// Reconcile the local state against an already located asset.
    ///
    /// # Errors
    ///
    /// See [`Reconciler::run`].
    pub async fn reconcile(&self, latest_version: &str, asset: &ReleaseAsset) -> Result<Outcome> {
        self.store.ensure_directories()?;
        self.store.clear_staging()?;

        let mut record = self.load_record()?;
        loop {
            let obs = self.observe(latest_version, &asset.name, record.as_ref())?;
            let step = plan(obs);
            debug!("Observed {:?}, plan {:?}", obs, step);

            match step {
                Plan::Migrate => {
                    if let Some(old) = record.take() {
                        self.migrate(&old)?;
                    }
                }
                Plan::Install => return self.install(latest_version, asset).await,
                Plan::Verify { purge_record } => {
                    if purge_record {
                        info!("Installed {} no longer matches its record, purging it", asset.name);
                        self.store.delete_record()?;
                    }
                    return self.verify(latest_version, asset).await;
                }
                Plan::ManualUpdate => {
                    info!("{} is a registered older release", asset.name);
                    return Ok(self.manual_update(asset));
                }
                Plan::UpToDate => {
                    debug!("{} is up to date at {}", asset.name, latest_version);
                    return Ok(Outcome::UpToDate {
                        version: latest_version.to_string(),
                    });
                }
            }
        }
    }

    /// Read the record, purging it if it is corrupt.
    fn load_record(&self) -> Result<Option<TrackingRecord>> {
        match self.store.read_record() {
            Ok(record) => Ok(record),
            Err(Error::CorruptRecord { path, reason }) => {
                warn!("Purging corrupt record {}: {}", path.display(), reason);
                self.store.delete_record()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn observe(
        &self,
        latest_version: &str,
        target: &str,
        record: Option<&TrackingRecord>,
    ) -> Result<Observation> {
        let installed = self.store.installed_artifact_exists(target);
        let mut obs = Observation {
            installed,
            record_valid: record.is_some(),
            ..Observation::default()
        };

        if let Some(record) = record {
            obs.filename_matches = record.filename == target;
            obs.version_matches = record.version == latest_version;
            if installed && obs.filename_matches {
                let current = self.hasher.hash(&self.store.installed_path(target))?;
                obs.hash_matches = current == record.hash;
            }
        }
        Ok(obs)
    }

    fn migrate(&self, old: &TrackingRecord) -> Result<()> {
        info!(
            "Host version changed, removing {} registered at {}",
            old.filename, old.version
        );
        self.store.delete_installed_file(&old.filename)?;
        self.store.delete_record()
    }

    async fn install(&self, latest_version: &str, asset: &ReleaseAsset) -> Result<Outcome> {
        info!("Installing {} ({})", asset.name, latest_version);
        if !self
            .store
            .final_download(&self.client, &asset.download_url, &asset.name)
            .await
        {
            return Err(Error::Download {
                url: asset.download_url.clone(),
            });
        }

        let hash = self.hasher.hash(&self.store.installed_path(&asset.name))?;
        self.store
            .write_record(&TrackingRecord::new(latest_version, hash, asset.name.as_str()))?;

        Ok(Outcome::Installed {
            version: latest_version.to_string(),
            filename: asset.name.clone(),
        })
    }

    /// Stage the release and adopt the installed file if the bytes match.
    async fn verify(&self, latest_version: &str, asset: &ReleaseAsset) -> Result<Outcome> {
        debug!("Staging {} for comparison", asset.name);
        if !self
            .store
            .stage_download(&self.client, &asset.download_url, &asset.name)
            .await
        {
            return Err(Error::Download {
                url: asset.download_url.clone(),
            });
        }

        let installed = self.hasher.hash(&self.store.installed_path(&asset.name))?;
        let staged = self.hasher.hash(&self.store.staged_path(&asset.name))?;

        match resolve_comparison(installed == staged) {
            Comparison::Adopt => {
                // Staging must be clean before the record claims anything.
                self.store.delete_staged_file(&asset.name)?;
                self.store
                    .write_record(&TrackingRecord::new(latest_version, installed, asset.name.as_str()))?;
                info!("Adopted installed {} as {}", asset.name, latest_version);
                Ok(Outcome::Adopted {
                    version: latest_version.to_string(),
                    filename: asset.name.clone(),
                })
            }
            Comparison::ManualUpdate => {
                info!("Installed {} differs from release {}", asset.name, latest_version);
                Ok(self.manual_update(asset))
            }
        }
    }

    fn manual_update(&self, asset: &ReleaseAsset) -> Outcome {
        Outcome::ManualUpdateRequired {
            download_url: asset.download_url.clone(),
            install_dir: self.store.layout().install_dir().to_path_buf(),
        }
    }
}
