//! Environment/runtime helpers
//!
//! Sanity checks run once at startup, before any storage is opened.

use std::path::Path;
use tracing::{debug, warn};

/// Ensure the directory holding persisted storage exists.
pub async fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    if data_dir.trim().is_empty() {
        warn!("empty data directory configured; storage files land in the working directory");
        return Ok(());
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    debug!(%data_dir, "data directory ready");
    Ok(())
}

/// Ensure the parent directory of `file` exists.
pub async fn ensure_parent_dir(file: &Path) -> anyhow::Result<()> {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            ensure_data_dir(&parent.to_string_lossy()).await
        }
        _ => Ok(()),
    }
}
