//! # native-updater
//!
//! Keeps a single prebuilt native plugin binary in sync with the latest
//! release published on a GitHub-style release feed.
//!
//! Every check follows the same path:
//! - the release feed is queried for the latest tag and its assets
//! - the asset matching the host's version and platform is located
//! - the tracking record and the installed file are reconciled against it
//!
//! Reconciliation either installs, silently adopts, leaves things alone, or
//! tells the user to update by hand. It never overwrites a binary the user
//! replaced on purpose.
//!
//! ## Example
//!
//! ```rust,ignore
//! use native_updater::{HostVersion, LogNotifier, Updater, UpdaterConfig};
//!
//! let config = UpdaterConfig::default();
//! let host = HostVersion::parse("4.1.5747-dev (Build 2024-06-01)");
//! let notifier = LogNotifier::new(config.notification_title());
//! let updater = Updater::from_config(&config, host, notifier)?;
//! let status = updater.spawn_check().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod event;
pub mod hasher;
pub mod notify;
pub mod platform;
pub mod reconcile;
pub mod release;
pub mod store;
pub mod updater;

pub use config::{HttpConfig, UpdaterConfig};
pub use error::{Error, Result};
pub use event::{create_event_channel, UpdateEvent, UpdateEventsChannel, UpdateEventsSender};
pub use hasher::{ContentHasher, Sha256Hasher};
pub use notify::{BufferedNotifier, LogNotifier, Notifier};
pub use platform::{HostVersion, Platform};
pub use reconcile::{Outcome, Reconciler};
pub use release::{HttpReleaseClient, ReleaseAsset, ReleaseClient, ReleaseInfo};
pub use store::{ArtifactStore, StoreLayout, TrackingRecord};
pub use updater::{CheckStatus, Updater};
