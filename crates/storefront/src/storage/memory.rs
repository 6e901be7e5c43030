use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::StorageArea;
use crate::errors::StorageError;

/// Ephemeral storage area, used for tests and sessions without a data dir.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_items<I, K, V>(items: I) -> Arc<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = items.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Arc::new(Self { items: RwLock::new(map) })
    }
}

#[async_trait]
impl StorageArea for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.items.write().await.remove(key).is_some())
    }
}
