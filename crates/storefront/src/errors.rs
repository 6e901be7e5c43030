use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(String),
    #[error("storage serialization error: {0}")]
    Serde(String),
}

/// Problems reading the persisted selection. Logged, never returned to callers.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("malformed persisted data under `{key}`: {source}")]
    MalformedPersistedData {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of a contextual request.
///
/// `E` is the error type of the underlying sender; it is passed through untouched.
#[derive(Debug, Error)]
pub enum FetchError<E> {
    #[error("No store selected")]
    NoStoreSelected,
    #[error("store id {0:?} is not a valid header value")]
    InvalidStoreId(String),
    #[error(transparent)]
    Upstream(E),
}

impl<E> FetchError<E> {
    pub fn is_no_store_selected(&self) -> bool {
        matches!(self, Self::NoStoreSelected)
    }
}
