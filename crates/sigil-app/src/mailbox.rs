//! Single-consumer action queue.
//!
//! Producers hold a cloned [`Mailbox`] and only ever post [`Action`]s; the
//! reactor owns the one [`Inbox`]. Ordering is FIFO across all producers.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::Action;

/// Create a connected mailbox and inbox.
pub fn mailbox() -> (Mailbox, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Mailbox { tx }, Inbox { rx })
}

/// Posting half, cloned into every producer.
#[derive(Debug, Clone)]
pub struct Mailbox {
    tx: mpsc::UnboundedSender<Action>,
}

impl Mailbox {
    /// Enqueue an action. Returns `false` once the reactor is gone.
    pub fn post(&self, action: Action) -> bool {
        self.tx.send(action).is_ok()
    }

    /// Enqueue an action after `delay` from a timer task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn post_after(&self, delay: Duration, action: Action) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(action).is_err() {
                tracing::debug!("reactor gone before timer fired");
            }
        });
    }

    /// Whether the reactor has dropped its inbox.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half, owned by the reactor.
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::UnboundedReceiver<Action>,
}

impl Inbox {
    /// Wait for the next action. `None` once every mailbox is dropped.
    pub async fn next(&mut self) -> Option<Action> {
        self.rx.recv().await
    }
}
