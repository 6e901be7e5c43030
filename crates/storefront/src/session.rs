//! Session wiring
//!
//! One [`StorefrontSession`] per running client owns the storage area, the
//! notification bus, the store context and the API clients. Components that
//! need store awareness get it from here instead of from globals.

use std::sync::Arc;

use configs::AppConfig;
use tracing::info;

use crate::bus::{ListenerHandle, LocationBus};
use crate::client::{ApiClient, ApiClients};
use crate::fetcher::ContextualFetcher;
use crate::storage::{file_store::FileStorage, StorageArea};
use crate::store::StoreContext;

pub struct StorefrontSession {
    storage: Arc<dyn StorageArea>,
    bus: LocationBus,
    store: StoreContext,
    clients: ApiClients,
    // keeps the mirror following the bus for the session's lifetime
    _listener: ListenerHandle,
}

impl StorefrontSession {
    /// Open file-backed storage from `cfg` and wire a session over it.
    pub async fn bootstrap(cfg: &AppConfig) -> anyhow::Result<Self> {
        common::env::ensure_data_dir(&cfg.storage.data_dir).await?;
        let path = cfg.storage.file_path();
        let storage: Arc<dyn StorageArea> = FileStorage::open(&path).await?;
        let clients = ApiClients::from_config(&cfg.api)?;
        info!(storage = %path.display(), "storefront session bootstrapped");
        Ok(Self::with_storage(storage, clients).await)
    }

    /// Wire a session over an existing storage area and clients.
    pub async fn with_storage(storage: Arc<dyn StorageArea>, clients: ApiClients) -> Self {
        let bus = LocationBus::new();
        let store = StoreContext::new(Arc::clone(&storage));
        store.initialize().await;
        let listener = store.subscribe_to_changes(&bus);
        Self { storage, bus, store, clients, _listener: listener }
    }

    /// Contextual fetcher over the `/api` client.
    pub fn fetcher(&self) -> ContextualFetcher<ApiClient> {
        ContextualFetcher::new(Arc::clone(&self.clients.api), self.store.clone())
    }

    /// Contextual fetcher over the backend-origin client.
    pub fn backend_fetcher(&self) -> ContextualFetcher<ApiClient> {
        ContextualFetcher::new(Arc::clone(&self.clients.backend), self.store.clone())
    }

    /// Re-read the persisted selection.
    pub async fn refresh(&self) {
        self.store.initialize().await;
    }

    pub fn bus(&self) -> &LocationBus {
        &self.bus
    }

    pub fn store(&self) -> &StoreContext {
        &self.store
    }

    pub fn storage(&self) -> &Arc<dyn StorageArea> {
        &self.storage
    }

    pub fn clients(&self) -> &ApiClients {
        &self.clients
    }
}
