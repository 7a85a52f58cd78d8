//! Observable values.
//!
//! A [`Signal`] holds a current value and broadcasts every replacement to its
//! subscribers. Readers that call [`Signal::get`] and subscribers that receive
//! an update agree on the value: the value is replaced and broadcast under the
//! same lock.

use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

/// Capacity of a signal's update channel.
const SIGNAL_CHANNEL_CAPACITY: usize = 32;

/// A value that can be read at any time and subscribed to for changes.
pub struct Signal<T> {
    value: RwLock<T>,
    tx: broadcast::Sender<T>,
}

impl<T: Clone> Signal<T> {
    /// Create a signal with an initial value.
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        Self {
            value: RwLock::new(initial),
            tx,
        }
    }

    /// The current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        let mut current = self.value.write().unwrap_or_else(PoisonError::into_inner);
        *current = value.clone();
        // No subscribers is not an error
        let _ = self.tx.send(value);
    }

    /// Subscribe to future values.
    ///
    /// The receiver only sees values set after this call; read the current
    /// value with [`Signal::get`].
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal").field("value", &self.get()).finish()
    }
}
