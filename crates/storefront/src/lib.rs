//! Store-context propagation for the storefront client.
//! - Mirrors the selected store from persistent storage into memory.
//! - Follows `storeLocationChanged` notifications.
//! - Decorates outgoing API calls with the selected store's identifier.

pub mod errors;
pub mod storage;
pub mod bus;
pub mod store;
pub mod fetcher;
pub mod client;
pub mod session;

pub use bus::{ListenerHandle, LocationBus};
pub use client::{ApiClient, ApiClients};
pub use errors::{FetchError, SelectionError, StorageError};
pub use fetcher::{ContextualFetcher, RequestOptions, RequestSender};
pub use session::StorefrontSession;
pub use storage::{file_store::FileStorage, memory::MemoryStorage, StorageArea};
pub use store::{StoreContext, StoreSelection};
