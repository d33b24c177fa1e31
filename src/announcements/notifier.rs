// Outbound broadcast of released announcements
// Push providers and chat webhooks live outside this service; releasing an
// announcement only needs something to hand it to.

use crate::announcements::models::Announcement;
use crate::error::ApiError;
use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Broadcasts a just-released announcement. Best effort.
    async fn announce(&self, announcement: &Announcement) -> Result<(), ApiError>;
}

/// Logs broadcasts instead of delivering them.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn announce(&self, announcement: &Announcement) -> Result<(), ApiError> {
        info!("Broadcasting announcement: {}", announcement.title);
        Ok(())
    }
}

/// Records announced titles so tests can assert on broadcasts.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingNotifier {
    pub announced: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
#[async_trait]
impl Notifier for RecordingNotifier {
    async fn announce(&self, announcement: &Announcement) -> Result<(), ApiError> {
        self.announced
            .lock()
            .unwrap()
            .push(announcement.title.clone());
        Ok(())
    }
}
