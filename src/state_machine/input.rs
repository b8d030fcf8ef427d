//! Pending input slot shared between producers and the run loop

use parking_lot::Mutex;

/// Holds at most one symbol awaiting consumption.
///
/// Every access is a whole-value exchange under the lock, so a reader sees
/// either the previous symbol, the new one, or nothing. With several
/// producers the last write wins.
#[derive(Debug)]
pub struct PendingInput<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Default for PendingInput<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> PendingInput<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `symbol`, returning the unconsumed symbol it displaced
    pub fn replace(&self, symbol: T) -> Option<T> {
        self.slot.lock().replace(symbol)
    }

    /// Empty the slot, returning what it held
    pub fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }
}
