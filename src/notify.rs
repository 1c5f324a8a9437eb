//! User notification sinks.

use parking_lot::Mutex;
use tracing::info;

/// Presents a plain-text message to the user.
pub trait Notifier: Send + Sync {
    /// Show `message`.
    fn notify(&self, message: &str);
}

/// Writes notifications to the log.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    title: String,
}

impl LogNotifier {
    /// Create a notifier that prefixes messages with `title`.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!("{}: {}", self.title, message);
    }
}

/// Keeps notifications until the host is ready to display them.
#[derive(Debug, Default)]
pub struct BufferedNotifier {
    messages: Mutex<Vec<String>>,
}

impl BufferedNotifier {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every buffered message, oldest first.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock())
    }

    /// Number of buffered messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl Notifier for BufferedNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, message: &str) {
        (**self).notify(message);
    }
}
