//! Update event system.

use tokio::sync::broadcast;

/// Events emitted while checking for updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    /// A check has started.
    CheckStarted,

    /// The artifact was downloaded and registered.
    Installed {
        /// Release tag.
        version: String,
        /// Installed file name.
        filename: String,
    },

    /// An existing artifact was registered as the latest release.
    Adopted {
        /// Release tag.
        version: String,
        /// Adopted file name.
        filename: String,
    },

    /// Nothing to do.
    UpToDate {
        /// Release tag.
        version: String,
    },

    /// The user must replace the artifact by hand.
    ManualUpdateRequired {
        /// Download location of the latest artifact.
        download_url: String,
    },

    /// The check ended with an error.
    Failed {
        /// Error message.
        message: String,
    },
}

/// Channel for receiving update events.
pub type UpdateEventsChannel = broadcast::Receiver<UpdateEvent>;

/// Sender for update events.
pub type UpdateEventsSender = broadcast::Sender<UpdateEvent>;

/// Create a new event channel pair.
#[must_use]
pub fn create_event_channel() -> (UpdateEventsSender, UpdateEventsChannel) {
    broadcast::channel(64)
}
