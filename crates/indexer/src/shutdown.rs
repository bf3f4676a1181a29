//! Cooperative shutdown signal shared by the pipeline tasks.

use std::sync::Arc;

use tokio::sync::watch;

/// Shutdown signal that can be cloned and shared.
///
/// Triggering is sticky: once set, every current and future waiter observes
/// it immediately.
#[derive(Clone)]
pub struct Shutdown {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Requests shutdown. Calling it again has no further effect.
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Completes when shutdown has been requested.
    pub async fn triggered(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as any clone of `self`, so this only
        // returns once the flag is set.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
