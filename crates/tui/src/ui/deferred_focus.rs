//! Deferred focus transfer into a freshly opened row editor.
//!
//! The row editor only exists from the next frame on, so focus is moved a
//! short, bounded delay after a row enters edit mode. The timer belongs to
//! the edit session: [`DeferredFocus`] aborts the pending task when dropped,
//! and the delivered message carries the session id so a late delivery for
//! an earlier session can be ignored.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;
use watchpad_types::{EditSessionId, Msg};

#[derive(Debug, Clone)]
pub struct FocusScheduler {
    sender: UnboundedSender<Msg>,
    delay: Duration,
}

impl FocusScheduler {
    pub fn new(sender: UnboundedSender<Msg>, delay: Duration) -> Self {
        Self { sender, delay }
    }

    /// Send `Msg::FocusEditField { session }` after the configured delay.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, session: EditSessionId) -> DeferredFocus {
        let sender = self.sender.clone();
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sender.send(Msg::FocusEditField { session }).is_err() {
                debug!(?session, "focus request dropped: message channel closed");
            }
        });
        DeferredFocus { handle }
    }
}

/// Pending focus transfer; aborted on drop.
#[derive(Debug)]
pub struct DeferredFocus {
    handle: JoinHandle<()>,
}

impl DeferredFocus {
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for DeferredFocus {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn delivers_focus_request_after_delay() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let scheduler = FocusScheduler::new(sender, Duration::from_millis(5));
        let session = EditSessionId::new(3);
        let _pending = scheduler.schedule(session);

        let msg = receiver.recv().await.unwrap();
        assert!(matches!(msg, Msg::FocusEditField { session: delivered } if delivered == session));
    }

    #[tokio::test]
    async fn dropping_the_timer_cancels_delivery() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let scheduler = FocusScheduler::new(sender, Duration::from_millis(20));
        let pending = scheduler.schedule(EditSessionId::new(1));
        drop(pending);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(receiver.try_recv().is_err());
    }
}
