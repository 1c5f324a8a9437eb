//! Background update checks.
//!
//! [`Updater`] wraps a [`Reconciler`] with the host-facing concerns: running
//! off the caller's thread, refusing overlapping checks, and turning every
//! result into a user notification and an [`UpdateEvent`].

use crate::config::UpdaterConfig;
use crate::error::{Error, Result};
use crate::event::{create_event_channel, UpdateEvent, UpdateEventsChannel, UpdateEventsSender};
use crate::hasher::{ContentHasher, Sha256Hasher};
use crate::notify::Notifier;
use crate::platform::{HostVersion, Platform};
use crate::reconcile::{Outcome, Reconciler};
use crate::release::{AssetNaming, HttpReleaseClient, ReleaseClient};
use crate::store::ArtifactStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How a requested check ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// The check reached a terminal outcome.
    Completed(Outcome),
    /// The check stopped on an error, which was reported to the user.
    Failed {
        /// User-facing message that was shown.
        message: String,
        /// Whether the user has to clean up by hand.
        manual_intervention: bool,
    },
    /// Another check was still running; nothing was done.
    AlreadyRunning,
}

/// Runs update checks for one installation directory.
pub struct Updater<C, N, H = Sha256Hasher> {
    reconciler: Arc<Reconciler<C, H>>,
    notifier: Arc<N>,
    host_name: String,
    events_tx: UpdateEventsSender,
    running: Arc<Mutex<()>>,
}

impl<C, N, H> Clone for Updater<C, N, H> {
    fn clone(&self) -> Self {
        Self {
            reconciler: Arc::clone(&self.reconciler),
            notifier: Arc::clone(&self.notifier),
            host_name: self.host_name.clone(),
            events_tx: self.events_tx.clone(),
            running: Arc::clone(&self.running),
        }
    }
}

impl<N: Notifier + 'static> Updater<HttpReleaseClient, N> {
    /// Build an updater talking to the configured release feed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] on platforms without an
    /// artifact flavour, or an error if the HTTP client cannot be built.
    pub fn from_config(config: &UpdaterConfig, host: HostVersion, notifier: N) -> Result<Self> {
        let platform = Platform::current()?;
        let client = HttpReleaseClient::new(config.feed_url(), &config.http)?;
        let store = ArtifactStore::new(config.layout());
        let naming = AssetNaming::new(config.product_name.clone(), platform);

        info!(
            "Tracking {} for {} on {} from {}",
            config.product_name,
            host,
            platform,
            config.feed_url()
        );

        Ok(Self::new(
            Reconciler::new(client, store, naming, host),
            notifier,
            config.host_name.clone(),
        ))
    }
}

impl<C, N, H> Updater<C, N, H>
where
    C: ReleaseClient + 'static,
    N: Notifier + 'static,
    H: ContentHasher + 'static,
{
    /// Wrap a reconciler.
    #[must_use]
    pub fn new(reconciler: Reconciler<C, H>, notifier: N, host_name: impl Into<String>) -> Self {
        let (events_tx, _) = create_event_channel();
        Self {
            reconciler: Arc::new(reconciler),
            notifier: Arc::new(notifier),
            host_name: host_name.into(),
            events_tx,
            running: Arc::new(Mutex::new(())),
        }
    }

    /// Subscribe to update events.
    #[must_use]
    pub fn subscribe_events(&self) -> UpdateEventsChannel {
        self.events_tx.subscribe()
    }

    /// The notifier results are reported to.
    #[must_use]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run one check on the tokio runtime and return its handle.
    ///
    /// If a check is already in flight the handle resolves immediately to
    /// [`CheckStatus::AlreadyRunning`].
    #[must_use]
    pub fn spawn_check(&self) -> JoinHandle<CheckStatus> {
        let Ok(guard) = Arc::clone(&self.running).try_lock_owned() else {
            warn!("Update check already running, skipping");
            return tokio::spawn(async { CheckStatus::AlreadyRunning });
        };

        let this = self.clone();
        tokio::spawn(async move {
            let status = this.check_locked().await;
            drop(guard);
            status
        })
    }

    /// Run one check on the current task.
    pub async fn check_now(&self) -> CheckStatus {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("Update check already running, skipping");
            return CheckStatus::AlreadyRunning;
        };
        self.check_locked().await
    }

    async fn check_locked(&self) -> CheckStatus {
        let _ = self.events_tx.send(UpdateEvent::CheckStarted);

        match self.reconciler.run().await {
            Ok(outcome) => {
                if let Some(notice) = outcome.notice(&self.host_name) {
                    self.notifier.notify(&notice);
                }
                let _ = self.events_tx.send(event_for(&outcome));
                CheckStatus::Completed(outcome)
            }
            Err(e) => self.report_failure(&e),
        }
    }

    fn report_failure(&self, e: &Error) -> CheckStatus {
        error!("Update check failed: {}", e);
        let message = e.user_message(&self.host_name);
        self.notifier.notify(&message);
        let _ = self.events_tx.send(UpdateEvent::Failed {
            message: message.clone(),
        });
        CheckStatus::Failed {
            message,
            manual_intervention: e.is_manual_intervention(),
        }
    }
}

fn event_for(outcome: &Outcome) -> UpdateEvent {
    match outcome {
        Outcome::Installed { version, filename } => UpdateEvent::Installed {
            version: version.clone(),
            filename: filename.clone(),
        },
        Outcome::Adopted { version, filename } => UpdateEvent::Adopted {
            version: version.clone(),
            filename: filename.clone(),
        },
        Outcome::UpToDate { version } => UpdateEvent::UpToDate {
            version: version.clone(),
        },
        Outcome::ManualUpdateRequired { download_url, .. } => {
            UpdateEvent::ManualUpdateRequired {
                download_url: download_url.clone(),
            }
        }
    }
}
