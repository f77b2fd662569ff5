//! The refresh signal shared between writers and the roster store.

use std::sync::Arc;

use tokio::sync::watch;

/// A boolean "please reload" signal.
///
/// Writers (the creation and assignment flows) [`raise`](RefreshFlag::raise)
/// it after the service confirms a write. The roster store observes the
/// change, triggers one reload, and clears the flag itself. Raising the flag
/// again before the store has observed it does not queue a second reload.
///
/// `Clone` is cheap: every clone shares the same underlying channel.
#[derive(Debug, Clone)]
pub struct RefreshFlag {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for RefreshFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshFlag {
    /// Create a lowered flag.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request a reload.
    pub fn raise(&self) {
        self.tx.send_replace(true);
    }

    /// Whether a reload has been requested and not yet picked up.
    pub fn is_raised(&self) -> bool {
        *self.tx.borrow()
    }

    /// Lower the flag, returning whether it was raised. Only the store that
    /// consumes the signal does this.
    pub(crate) fn take(&self) -> bool {
        self.tx.send_replace(false)
    }

    /// Receiver used by the store to wait for the flag to change.
    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
