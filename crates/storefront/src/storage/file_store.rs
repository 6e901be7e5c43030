use std::{collections::HashMap, path::{Path, PathBuf}, sync::Arc};

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};
use tracing::{debug, warn};

use super::StorageArea;
use crate::errors::StorageError;

/// JSON file-backed storage area.
///
/// Keeps every item in memory and rewrites the whole file on each change,
/// which is fine for the handful of keys a storefront client persists.
#[derive(Debug)]
pub struct FileStorage {
    items: RwLock<HashMap<String, String>>,
    file_path: PathBuf,
}

impl FileStorage {
    /// Open the area at `path`. Creates the file with an empty map if missing;
    /// a corrupt file is treated as empty and overwritten on the next write.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, StorageError> {
        let file_path = path.into();
        common::env::ensure_parent_dir(&file_path)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        let items: HashMap<String, String> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %file_path.display(), error = %e, "storage file is corrupt; starting empty");
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty = HashMap::new();
                write_map(&file_path, &empty).await?;
                debug!(path = %file_path.display(), "created storage file");
                empty
            }
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };

        Ok(Arc::new(Self { items: RwLock::new(items), file_path }))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

async fn write_map(path: &Path, map: &HashMap<String, String>) -> Result<(), StorageError> {
    let data = serde_json::to_vec(map).map_err(|e| StorageError::Serde(e.to_string()))?;
    fs::write(path, data).await.map_err(|e| StorageError::Io(e.to_string()))
}

#[async_trait]
impl StorageArea for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // write lock held across the file write so the file follows map order
        let mut items = self.items.write().await;
        items.insert(key.to_string(), value.to_string());
        write_map(&self.file_path, &items).await
    }

    async fn remove_item(&self, key: &str) -> Result<bool, StorageError> {
        let mut items = self.items.write().await;
        let existed = items.remove(key).is_some();
        if existed {
            write_map(&self.file_path, &items).await?;
        }
        Ok(existed)
    }
}
