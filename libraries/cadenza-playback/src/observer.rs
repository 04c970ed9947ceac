//! Observer registry for session state fan-out

use std::sync::Arc;

use cadenza_core::PlayableItem;
use parking_lot::Mutex;

use crate::types::PlaybackNotice;

/// Listener for session state changes
///
/// Callbacks run synchronously on the thread that changed the session, in
/// registration order. Implementations may call back into the session.
pub trait PlayerObserver: Send + Sync {
    /// A new item became current
    fn on_song_selected(&self, item: &PlayableItem, index: usize);

    /// Playing flag changed (or was re-asserted)
    fn on_playback_state_changed(&self, playing: bool);

    /// Best-effort message for the user
    fn on_notice(&self, _notice: &PlaybackNotice) {}
}

/// Identity of an observer is its allocation
fn same_observer(a: &Arc<dyn PlayerObserver>, b: &Arc<dyn PlayerObserver>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// Ordered set of observers
///
/// Notification iterates over a copy of the list, so observers may register
/// or unregister (themselves or others) from inside a callback. An observer
/// removed mid-notification is skipped for the rest of that round.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Mutex<Vec<Arc<dyn PlayerObserver>>>,
}

impl ObserverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer; returns false if it was already registered
    pub fn register(&self, observer: Arc<dyn PlayerObserver>) -> bool {
        let mut observers = self.observers.lock();
        if observers.iter().any(|o| same_observer(o, &observer)) {
            return false;
        }
        observers.push(observer);
        true
    }

    /// Remove an observer; returns false if it was not registered
    pub fn unregister(&self, observer: &Arc<dyn PlayerObserver>) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|o| !same_observer(o, observer));
        observers.len() != before
    }

    /// Check membership
    pub fn contains(&self, observer: &Arc<dyn PlayerObserver>) -> bool {
        self.observers
            .lock()
            .iter()
            .any(|o| same_observer(o, observer))
    }

    /// Number of observers
    pub fn len(&self) -> usize {
        self.observers.lock().len()
    }

    /// Check if no observer is registered
    pub fn is_empty(&self) -> bool {
        self.observers.lock().is_empty()
    }

    /// Call `f` for every observer in registration order
    pub fn notify(&self, f: impl Fn(&dyn PlayerObserver)) {
        let snapshot = self.observers.lock().clone();
        for observer in &snapshot {
            if self.contains(observer) {
                f(observer.as_ref());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        calls: AtomicUsize,
    }

    impl PlayerObserver for Counter {
        fn on_song_selected(&self, _item: &PlayableItem, _index: usize) {}

        fn on_playback_state_changed(&self, _playing: bool) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn registration_is_idempotent() {
        let registry = ObserverRegistry::new();
        let observer: Arc<dyn PlayerObserver> = Arc::new(Counter::default());

        assert!(registry.register(Arc::clone(&observer)));
        assert!(!registry.register(Arc::clone(&observer)));
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister(&observer));
        assert!(!registry.unregister(&observer));
        assert!(registry.is_empty());
    }

    #[test]
    fn distinct_allocations_are_distinct_observers() {
        let registry = ObserverRegistry::new();
        registry.register(Arc::new(Counter::default()));
        registry.register(Arc::new(Counter::default()));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn observer_removed_mid_round_is_skipped() {
        let registry = Arc::new(ObserverRegistry::new());
        let first = Arc::new(Counter::default());
        let second = Arc::new(Counter::default());
        let second_dyn: Arc<dyn PlayerObserver> = second.clone();

        registry.register(first.clone());
        registry.register(second_dyn.clone());

        let calls = AtomicUsize::new(0);
        registry.notify(|observer| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                registry.unregister(&second_dyn);
            }
            observer.on_playback_state_changed(true);
        });

        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.len(), 1);
    }
}
