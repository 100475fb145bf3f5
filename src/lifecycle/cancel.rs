//! Cancellation signal shared by a group of subscription tasks.

use tokio::sync::broadcast;

/// Fan-out cancellation for long-running receive loops.
///
/// Every task subscribes before it starts; `trigger` wakes all of them at
/// once. Dropping the signal closes the channel, which subscribers observe
/// as a cancellation too, so a caller that abandons a wait still tears its
/// tasks down.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: broadcast::Sender<()>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to hand to one task.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscribed task to stop.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns a signal and triggers it when dropped.
///
/// Held by a waiting future so that dropping the future mid-wait still stops
/// its subscriptions.
#[derive(Debug)]
pub struct CancelOnDrop(pub CancelSignal);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.trigger();
    }
}
