pub mod format;
pub mod telegram;

use async_trait::async_trait;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("delivery rejected ({0}): {1}")]
    Rejected(u16, String),
}

/// Outbound message delivery. Callers treat every send as best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, destination: &str, text: &str) -> Result<(), NotifyError>;
}

/// Dry-run notifier that writes messages to the log
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, destination: &str, text: &str) -> Result<(), NotifyError> {
        info!("📨 [dry-run → {}]\n{}", destination, text);
        Ok(())
    }
}
