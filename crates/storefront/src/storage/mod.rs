//! Persistent client-side storage
//!
//! String-keyed, string-valued areas in the manner of browser `localStorage`.
//! The store context only reads from them; writers are the store picker UI
//! and tests.

use async_trait::async_trait;

use crate::errors::StorageError;

pub mod file_store;
pub mod memory;

/// Trait abstraction for a local storage area.
/// Implementations can be file-backed, in-memory, or bridged to a real browser.
#[async_trait]
pub trait StorageArea: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Remove a key; returns whether it existed.
    async fn remove_item(&self, key: &str) -> Result<bool, StorageError>;
}
