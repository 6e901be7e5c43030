//! In-process `storeLocationChanged` notification target.
//!
//! Dispatch is synchronous: every listener has finished by the time
//! [`LocationBus::dispatch`] returns, so a reader on the same task never
//! observes a half-applied change.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use common::types::{StoreLocationChanged, STORE_LOCATION_CHANGED_EVENT};
use dashmap::DashMap;
use tracing::debug;

type Listener<D> = Arc<dyn Fn(&StoreLocationChanged<D>) + Send + Sync>;
type Listeners<D> = DashMap<u64, Listener<D>>;

pub struct LocationBus<D = serde_json::Value> {
    listeners: Arc<Listeners<D>>,
    next_id: AtomicU64,
}

impl<D: 'static> Default for LocationBus<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: 'static> LocationBus<D> {
    pub fn new() -> Self {
        Self { listeners: Arc::new(DashMap::new()), next_id: AtomicU64::new(1) }
    }

    /// Register `listener`; it stays registered until the returned handle is
    /// unsubscribed or dropped.
    pub fn add_listener<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&StoreLocationChanged<D>) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.insert(id, Arc::new(listener));
        debug!(event = STORE_LOCATION_CHANGED_EVENT, listener_id = id, "listener added");

        let registry: Weak<Listeners<D>> = Arc::downgrade(&self.listeners);
        ListenerHandle {
            id,
            detach: Some(Box::new(move || {
                if let Some(listeners) = registry.upgrade() {
                    listeners.remove(&id);
                    debug!(event = STORE_LOCATION_CHANGED_EVENT, listener_id = id, "listener removed");
                }
            })),
        }
    }

    /// Deliver `event` to every registered listener in registration order.
    /// Returns how many listeners ran.
    pub fn dispatch(&self, event: &StoreLocationChanged<D>) -> usize {
        // snapshot first: a listener may deregister itself while running
        let mut snapshot: Vec<(u64, Listener<D>)> = self
            .listeners
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        snapshot.sort_unstable_by_key(|(id, _)| *id);

        debug!(
            event = STORE_LOCATION_CHANGED_EVENT,
            store_uuid = %event.store_uuid,
            listeners = snapshot.len(),
            "dispatching"
        );
        for (_, listener) in &snapshot {
            listener(event);
        }
        snapshot.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Deregistration handle returned by [`LocationBus::add_listener`].
pub struct ListenerHandle {
    id: u64,
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ListenerHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop listening now instead of at drop.
    pub fn unsubscribe(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .field("attached", &self.detach.is_some())
            .finish()
    }
}
