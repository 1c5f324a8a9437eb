//! Filesystem-backed artifact store.
//!
//! The store owns three locations inside the host's plugin directory:
//! - the installed artifact itself (`<install_dir>/<filename>`)
//! - the tracking record (`<install_dir>/<record_dir>/<plugin>.data`)
//! - a staging directory for candidate downloads (`<install_dir>/<staging_dir>`)
//!
//! The record is three newline-separated lines: version, hash, filename.
//! Anything else is corrupt and must be purged by the caller.

use crate::error::{Error, Result};
use crate::release::ReleaseClient;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Resolved paths used by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    install_dir: PathBuf,
    record_dir: PathBuf,
    staging_dir: PathBuf,
    record_file: PathBuf,
}

impl StoreLayout {
    /// Build the layout rooted at `install_dir`.
    #[must_use]
    pub fn new(
        install_dir: PathBuf,
        record_dir_name: &str,
        staging_dir_name: &str,
        plugin_name: &str,
    ) -> Self {
        let record_dir = install_dir.join(record_dir_name);
        let record_file = record_dir.join(format!("{plugin_name}.data"));
        let staging_dir = install_dir.join(staging_dir_name);
        Self {
            install_dir,
            record_dir,
            staging_dir,
            record_file,
        }
    }

    /// Directory the artifact is installed into.
    #[must_use]
    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Directory holding the tracking record.
    #[must_use]
    pub fn record_dir(&self) -> &Path {
        &self.record_dir
    }

    /// Scratch directory for staged downloads.
    #[must_use]
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// The tracking record file.
    #[must_use]
    pub fn record_file(&self) -> &Path {
        &self.record_file
    }
}

/// What the updater believes is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingRecord {
    /// Release tag the artifact came from.
    pub version: String,
    /// Content hash of the artifact when it was registered.
    pub hash: String,
    /// Artifact file name inside the install directory.
    pub filename: String,
}

impl TrackingRecord {
    /// Create a record.
    #[must_use]
    pub fn new(
        version: impl Into<String>,
        hash: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            hash: hash.into(),
            filename: filename.into(),
        }
    }

    /// Parse the on-disk representation.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the content is not exactly
    /// three non-empty lines or the filename is not a bare file name.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let lines: Vec<&str> = content.lines().collect();
        let [version, hash, filename] = lines.as_slice() else {
            return Err(format!("expected 3 lines, found {}", lines.len()));
        };

        if version.is_empty() || hash.is_empty() || filename.is_empty() {
            return Err("empty field".to_string());
        }
        if !is_bare_file_name(filename) {
            return Err(format!("filename {filename:?} is not a plain file name"));
        }

        Ok(Self::new(*version, *hash, *filename))
    }

    /// Serialize to the on-disk representation.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}\n{}\n{}", self.version, self.hash, self.filename)
    }
}

/// Whether `name` is a single path component with no directory parts.
#[must_use]
pub fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().is_some_and(|f| f == name)
}

/// Persistence for the tracking record, the staging area and the artifact.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    layout: StoreLayout,
}

impl ArtifactStore {
    /// Create a store over `layout`. Nothing is touched on disk.
    #[must_use]
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    /// The layout this store operates on.
    #[must_use]
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Path of an installed artifact.
    #[must_use]
    pub fn installed_path(&self, filename: &str) -> PathBuf {
        self.layout.install_dir.join(filename)
    }

    /// Path of a staged download.
    #[must_use]
    pub fn staged_path(&self, filename: &str) -> PathBuf {
        self.layout.staging_dir.join(filename)
    }

    /// Create the record and staging directories if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if either directory cannot be created.
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.layout.record_dir)?;
        fs::create_dir_all(&self.layout.staging_dir)?;
        Ok(())
    }

    /// Remove every entry of the staging directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CleanupFailure`] for the first entry that cannot be
    /// removed; remaining entries are left alone.
    pub fn clear_staging(&self) -> Result<()> {
        let entries = match fs::read_dir(&self.layout.staging_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            let removed = if is_dir {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            if let Err(e) = removed {
                warn!("Failed to clear staged entry {}: {}", path.display(), e);
                return Err(Error::CleanupFailure { path });
            }
            debug!("Cleared staged entry {}", path.display());
        }
        Ok(())
    }

    /// Read the tracking record.
    ///
    /// Returns `Ok(None)` when no record exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptRecord`] if the record exists but cannot be
    /// read or parsed; the caller is expected to purge it.
    pub fn read_record(&self) -> Result<Option<TrackingRecord>> {
        let path = &self.layout.record_file;
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::CorruptRecord {
                    path: path.clone(),
                    reason: e.to_string(),
                })
            }
        };

        TrackingRecord::parse(&content)
            .map(Some)
            .map_err(|reason| Error::CorruptRecord {
                path: path.clone(),
                reason,
            })
    }

    /// Replace the tracking record.
    ///
    /// The record is written to a temp file and renamed over the old one.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub fn write_record(&self, record: &TrackingRecord) -> Result<()> {
        fs::create_dir_all(&self.layout.record_dir)?;
        let mut file = tempfile::NamedTempFile::new_in(&self.layout.record_dir)?;
        file.write_all(record.render().as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.layout.record_file)
            .map_err(|e| Error::Io(e.error))?;

        info!(
            "Registered {} (version {}, hash {})",
            record.filename, record.version, record.hash
        );
        Ok(())
    }

    /// Delete the tracking record. Succeeds if it is already gone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CleanupFailure`] if the record is still present.
    pub fn delete_record(&self) -> Result<()> {
        remove_file_verified(&self.layout.record_file)
    }

    /// Whether the artifact `filename` is installed.
    #[must_use]
    pub fn installed_artifact_exists(&self, filename: &str) -> bool {
        self.installed_path(filename).is_file()
    }

    /// Delete an installed artifact. Succeeds if it is already gone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CleanupFailure`] if the artifact is still present.
    pub fn delete_installed_file(&self, filename: &str) -> Result<()> {
        remove_file_verified(&self.installed_path(filename))
    }

    /// Delete a staged download. Succeeds if it is already gone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CleanupFailure`] if the staged file is still present.
    pub fn delete_staged_file(&self, filename: &str) -> Result<()> {
        remove_file_verified(&self.staged_path(filename))
    }

    /// Download `url` into the staging directory as `filename`.
    ///
    /// Returns `false` on any transport or write failure.
    pub async fn stage_download<C: ReleaseClient>(
        &self,
        client: &C,
        url: &str,
        filename: &str,
    ) -> bool {
        download_soft(client, url, &self.staged_path(filename)).await
    }

    /// Download `url` straight to the install path of `filename`.
    ///
    /// Returns `false` on any transport or write failure.
    pub async fn final_download<C: ReleaseClient>(
        &self,
        client: &C,
        url: &str,
        filename: &str,
    ) -> bool {
        download_soft(client, url, &self.installed_path(filename)).await
    }
}

async fn download_soft<C: ReleaseClient>(client: &C, url: &str, dest: &Path) -> bool {
    match client.download(url, dest).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Download of {} to {} failed: {}", url, dest.display(), e);
            false
        }
    }
}

/// Remove a file and confirm it is gone.
fn remove_file_verified(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => debug!("Deleted {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            warn!("Failed to delete {}: {}", path.display(), e);
            return Err(Error::CleanupFailure {
                path: path.to_path_buf(),
            });
        }
    }

    if fs::symlink_metadata(path).is_ok() {
        return Err(Error::CleanupFailure {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
