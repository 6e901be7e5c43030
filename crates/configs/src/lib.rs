use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir(), file_name: default_file_name() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Backend origin, without the `/api` prefix.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Base for API calls; derived from `backend_url` when empty.
    #[serde(default)]
    pub api_url: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            api_url: String::new(),
            request_timeout_secs: default_timeout(),
        }
    }
}

fn default_data_dir() -> String { "data".into() }
fn default_file_name() -> String { "local_storage.json".into() }
fn default_backend_url() -> String { "http://127.0.0.1:8000".into() }
fn default_timeout() -> u64 { 30 }

/// Load from `CONFIG_PATH` (default `config.toml`); a missing file yields defaults.
pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if std::fs::metadata(&path).is_err() {
        warn!(%path, "config file not found; using defaults");
        return Ok(AppConfig::default());
    }
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    info!(%path, "configuration loaded");
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Apply `STOREFRONT_DATA_DIR`, `BACKEND_URL` and `API_BASE` overrides.
    ///
    /// The lookup is injected so tests do not have to mutate process env.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("STOREFRONT_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            self.storage.data_dir = dir;
        }
        if let Some(url) = lookup("BACKEND_URL").filter(|v| !v.trim().is_empty()) {
            self.api.backend_url = url;
        }
        if let Some(url) = lookup("API_BASE").filter(|v| !v.trim().is_empty()) {
            self.api.api_url = url;
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.storage.normalize();
        // 归一化 api（api_url 为空时由 backend_url 推导出 /api 前缀）
        self.api.normalize();
        self.api.validate()?;
        Ok(())
    }
}

impl StorageConfig {
    fn normalize(&mut self) {
        if self.file_name.trim().is_empty() {
            self.file_name = default_file_name();
        }
    }

    pub fn file_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.file_name)
    }
}

impl ApiConfig {
    fn normalize(&mut self) {
        self.backend_url = self.backend_url.trim().trim_end_matches('/').to_string();
        if self.backend_url.is_empty() {
            self.backend_url = default_backend_url();
        }
        self.api_url = self.api_url.trim().trim_end_matches('/').to_string();
        if self.api_url.is_empty() {
            self.api_url = format!("{}/api", self.backend_url);
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("api.backend_url", &self.backend_url), ("api.api_url", &self.api_url)] {
            let lower = url.to_lowercase();
            if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                return Err(anyhow!("{name} must start with http:// or https://, got {url:?}"));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("api.request_timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
