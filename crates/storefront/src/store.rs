//! Selected-store mirror
//!
//! [`StoreContext`] keeps an in-memory copy of the store picked in the UI.
//! It is rebuilt from persistent storage by [`StoreContext::initialize`] and
//! replaced wholesale by every `storeLocationChanged` notification. Storage
//! remains the source of truth; the mirror is a best-effort cache.

use std::sync::Arc;

use arc_swap::ArcSwap;
use common::types::{SELECTED_LOCATION_KEY, SELECTED_STORE_UUID_KEY};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::bus::{ListenerHandle, LocationBus};
use crate::errors::SelectionError;
use crate::storage::StorageArea;

/// The user's current store choice.
///
/// Data is only ever present together with an identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSelection<D = serde_json::Value> {
    store_id: Option<String>,
    store_data: Option<D>,
}

impl<D> Default for StoreSelection<D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<D> StoreSelection<D> {
    pub fn empty() -> Self {
        Self { store_id: None, store_data: None }
    }

    /// An empty identifier yields [`empty`](Self::empty); the data is dropped
    /// with it.
    pub fn new(store_id: impl Into<String>, store_data: D) -> Self {
        let store_id = store_id.into();
        if store_id.is_empty() {
            return Self::empty();
        }
        Self { store_id: Some(store_id), store_data: Some(store_data) }
    }

    pub fn store_id(&self) -> Option<&str> {
        self.store_id.as_deref()
    }

    pub fn store_data(&self) -> Option<&D> {
        self.store_data.as_ref()
    }

    pub fn is_selected(&self) -> bool {
        self.store_id().is_some()
    }
}

/// Parse a persisted `(id, blob)` pair into a selection.
fn parse_selection<D: DeserializeOwned>(
    store_id: String,
    raw: &str,
) -> Result<StoreSelection<D>, SelectionError> {
    let data = serde_json::from_str(raw).map_err(|source| SelectionError::MalformedPersistedData {
        key: SELECTED_LOCATION_KEY,
        source,
    })?;
    Ok(StoreSelection::new(store_id, data))
}

pub struct StoreContext<D = serde_json::Value> {
    storage: Arc<dyn StorageArea>,
    mirror: Arc<ArcSwap<StoreSelection<D>>>,
}

impl<D> Clone for StoreContext<D> {
    fn clone(&self) -> Self {
        Self { storage: Arc::clone(&self.storage), mirror: Arc::clone(&self.mirror) }
    }
}

impl<D> StoreContext<D>
where
    D: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Build an empty mirror over `storage`. Call [`initialize`](Self::initialize)
    /// to load the persisted selection.
    pub fn new(storage: Arc<dyn StorageArea>) -> Self {
        Self { storage, mirror: Arc::new(ArcSwap::from_pointee(StoreSelection::empty())) }
    }

    /// Load the persisted selection into the mirror.
    ///
    /// Only a complete, parseable pair replaces the mirror. Missing keys,
    /// storage failures and malformed data are logged and leave it as it
    /// was. Safe to call repeatedly.
    pub async fn initialize(&self) {
        let store_id = self.read_key(SELECTED_STORE_UUID_KEY).await;
        let raw = self.read_key(SELECTED_LOCATION_KEY).await;

        let (store_id, raw) = match (store_id, raw) {
            (Some(id), Some(raw)) => (id, raw),
            (id, raw) => {
                debug!(
                    has_id = id.is_some(),
                    has_data = raw.is_some(),
                    "no complete persisted store selection"
                );
                return;
            }
        };

        match parse_selection::<D>(store_id, &raw) {
            Ok(selection) => {
                info!(store_uuid = ?selection.store_id(), "store selection loaded from storage");
                self.mirror.store(Arc::new(selection));
            }
            Err(e) => error!(error = %e, "error parsing persisted store data"),
        }
    }

    async fn read_key(&self, key: &'static str) -> Option<String> {
        match self.storage.get_item(key).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(%key, error = %e, "storage read failed");
                None
            }
        }
    }

    /// Follow `storeLocationChanged` on `bus`. Each notification replaces the
    /// whole mirror; the returned handle stops the updates when dropped.
    pub fn subscribe_to_changes(&self, bus: &LocationBus<D>) -> ListenerHandle {
        let mirror = Arc::clone(&self.mirror);
        bus.add_listener(move |event| {
            mirror.store(Arc::new(StoreSelection::new(
                event.store_uuid.clone(),
                event.store_data.clone(),
            )));
            debug!(store_uuid = %event.store_uuid, "store selection replaced by notification");
        })
    }

    pub fn current_id(&self) -> Option<String> {
        self.mirror.load().store_id().map(str::to_owned)
    }

    pub fn current_data(&self) -> Option<D> {
        self.mirror.load().store_data().cloned()
    }

    /// Consistent view of identifier and data together.
    pub fn snapshot(&self) -> Arc<StoreSelection<D>> {
        self.mirror.load_full()
    }

    /// Identifier for a contextual request: the mirror first, then the
    /// persisted value for callers whose mirror was never initialized.
    pub async fn resolve_id(&self) -> Option<String> {
        match self.current_id() {
            Some(id) => Some(id),
            None => self.read_key(SELECTED_STORE_UUID_KEY).await,
        }
    }
}
