//! Subscriber registry shared by the stores.
//! Callbacks are invoked outside of the registry lock so a subscriber may
//! (un)subscribe or read the store from inside its callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

pub type SubscriptionId = u64;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct Observers<T> {
    next_id: AtomicU64,
    subs: RwLock<Vec<(SubscriptionId, Callback<T>)>>,
}

impl<T> Default for Observers<T> {
    fn default() -> Self { Self { next_id: AtomicU64::new(1), subs: RwLock::new(Vec::new()) } }
}

impl<T> Observers<T> {
    pub fn new() -> Self { Self::default() }

    pub fn subscribe<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subs.write().push((id, Arc::new(f)));
        id
    }

    /// Returns false when the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subs.write();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }

    pub fn notify(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self.subs.read().iter().map(|(_, cb)| cb.clone()).collect();
        for cb in callbacks {
            cb(value);
        }
    }
}
