//! Store-scoped request decoration
//!
//! [`ContextualFetcher`] wraps any [`RequestSender`] and adds the selected
//! store's identifier to each call, both as the `X-Store-UUID` header and as
//! the `store_uuid` query parameter. Backends differ in which one they read.

use std::sync::Arc;

use async_trait::async_trait;
use common::types::STORE_UUID_QUERY_PARAM;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::FetchError;
use crate::store::StoreContext;

/// Header name for [`common::types::STORE_UUID_HEADER`] in its wire (lowercase) form.
pub fn store_uuid_header() -> HeaderName {
    HeaderName::from_static("x-store-uuid")
}

/// Caller-supplied request options. Decoration extends them; nothing the
/// caller set is dropped.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self { method, ..Self::default() }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, serde_json::Error> {
        Ok(self.body(serde_json::to_vec(value)?))
    }
}

/// The request primitive being decorated.
#[async_trait]
pub trait RequestSender: Send + Sync {
    type Response: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn send(&self, url: &str, options: RequestOptions) -> Result<Self::Response, Self::Error>;
}

/// Append the store query parameter to `url` and the store header to `options`.
///
/// The identifier is appended verbatim; callers pass identifiers that are
/// already URL-safe (store UUIDs).
pub fn decorate(
    url: &str,
    mut options: RequestOptions,
    store_id: &str,
) -> Result<(String, RequestOptions), HeaderValueError> {
    let value = HeaderValue::from_str(store_id).map_err(|_| HeaderValueError(store_id.to_string()))?;
    options.headers.insert(store_uuid_header(), value);

    // 查询参数必须位于片段(#)之前
    let (target, fragment) = match url.find('#') {
        Some(at) => url.split_at(at),
        None => (url, ""),
    };
    let separator = if target.contains('?') { '&' } else { '?' };
    let url = format!("{target}{separator}{STORE_UUID_QUERY_PARAM}={store_id}{fragment}");
    Ok((url, options))
}

/// The store identifier cannot be carried in a header.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("store id {0:?} is not a valid header value")]
pub struct HeaderValueError(pub String);

pub struct ContextualFetcher<S, D = serde_json::Value> {
    sender: Arc<S>,
    store: StoreContext<D>,
}

impl<S, D> Clone for ContextualFetcher<S, D> {
    fn clone(&self) -> Self {
        Self { sender: Arc::clone(&self.sender), store: self.store.clone() }
    }
}

impl<S, D> ContextualFetcher<S, D>
where
    S: RequestSender,
    D: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(sender: Arc<S>, store: StoreContext<D>) -> Self {
        Self { sender, store }
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Send `url` with `options`, scoped to the selected store.
    ///
    /// Fails with [`FetchError::NoStoreSelected`] before anything is sent when
    /// no identifier is known. The sender's result is returned as is.
    pub async fn fetch(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<S::Response, FetchError<S::Error>> {
        let Some(store_id) = self.store.resolve_id().await else {
            warn!(%url, "contextual request refused: no store selected");
            return Err(FetchError::NoStoreSelected);
        };

        let (url, options) =
            decorate(url, options, &store_id).map_err(|e| FetchError::InvalidStoreId(e.0))?;
        debug!(%url, method = %options.method, store_uuid = %store_id, "sending contextual request");

        self.sender.send(&url, options).await.map_err(FetchError::Upstream)
    }

    pub async fn get(&self, url: &str) -> Result<S::Response, FetchError<S::Error>> {
        self.fetch(url, RequestOptions::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::LocationBus;
    use crate::storage::memory::MemoryStorage;
    use common::types::{StoreLocationChanged, SELECTED_STORE_UUID_KEY, STORE_UUID_HEADER};
    use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("upstream unavailable: {0}")]
    struct Unavailable(u16);

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, RequestOptions)>>,
        fail_with: Option<u16>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<(String, RequestOptions)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RequestSender for Recorder {
        type Response = &'static str;
        type Error = Unavailable;

        async fn send(&self, url: &str, options: RequestOptions) -> Result<Self::Response, Self::Error> {
            self.calls.lock().unwrap().push((url.to_string(), options));
            match self.fail_with {
                Some(code) => Err(Unavailable(code)),
                None => Ok("ok"),
            }
        }
    }

    fn fetcher_with(items: &[(&str, &str)], recorder: Recorder) -> (ContextualFetcher<Recorder>, StoreContext) {
        let store = StoreContext::new(MemoryStorage::with_items(items.iter().copied()));
        (ContextualFetcher::new(Arc::new(recorder), store.clone()), store)
    }

    #[test]
    fn header_constant_matches_wire_name() {
        assert!(store_uuid_header().as_str().eq_ignore_ascii_case(STORE_UUID_HEADER));
    }

    #[test]
    fn decorate_picks_separator() {
        let (url, opts) = decorate("/products?sort=asc", RequestOptions::default(), "s1").unwrap();
        assert_eq!(url, "/products?sort=asc&store_uuid=s1");
        assert_eq!(opts.headers.get(store_uuid_header()).unwrap(), "s1");

        let (url, _) = decorate("/products", RequestOptions::default(), "s1").unwrap();
        assert_eq!(url, "/products?store_uuid=s1");
    }

    #[test]
    fn decorate_keeps_fragment_last() {
        let (url, _) = decorate("/products#top", RequestOptions::default(), "s1").unwrap();
        assert_eq!(url, "/products?store_uuid=s1#top");

        let (url, _) = decorate("/products?sort=asc#top", RequestOptions::default(), "s1").unwrap();
        assert_eq!(url, "/products?sort=asc&store_uuid=s1#top");
    }

    #[test]
    fn decorate_rejects_unheaderable_id() {
        let err = decorate("/products", RequestOptions::default(), "bad\nid").unwrap_err();
        assert_eq!(err, HeaderValueError("bad\nid".into()));
    }

    #[tokio::test]
    async fn no_store_selected_fails_before_sending() {
        let (fetcher, _) = fetcher_with(&[], Recorder::default());
        let err = fetcher.get("/products").await.unwrap_err();

        assert!(err.is_no_store_selected());
        assert_eq!(err.to_string(), "No store selected");
        assert!(fetcher.sender().calls().is_empty());
    }

    #[tokio::test]
    async fn mirror_identifier_decorates_request() {
        let (fetcher, store) = fetcher_with(&[], Recorder::default());
        let bus = LocationBus::new();
        let _handle = store.subscribe_to_changes(&bus);
        bus.dispatch(&StoreLocationChanged::new("s1", json!({"name": "A"})));

        assert_eq!(fetcher.get("/products?sort=asc").await.unwrap(), "ok");
        assert_eq!(fetcher.get("/products").await.unwrap(), "ok");

        let calls = fetcher.sender().calls();
        assert_eq!(calls[0].0, "/products?sort=asc&store_uuid=s1");
        assert_eq!(calls[0].1.method, Method::GET);
        assert_eq!(calls[0].1.headers.get(store_uuid_header()).unwrap(), "s1");
        assert_eq!(calls[1].0, "/products?store_uuid=s1");
    }

    #[tokio::test]
    async fn persisted_identifier_is_the_fallback() {
        let (fetcher, store) = fetcher_with(&[(SELECTED_STORE_UUID_KEY, "s9")], Recorder::default());
        assert_eq!(store.current_id(), None);

        fetcher.get("/products").await.unwrap();
        let calls = fetcher.sender().calls();
        assert_eq!(calls[0].0, "/products?store_uuid=s9");
        assert_eq!(calls[0].1.headers.get(store_uuid_header()).unwrap(), "s9");
    }

    #[tokio::test]
    async fn caller_options_survive() {
        let (fetcher, _) = fetcher_with(&[(SELECTED_STORE_UUID_KEY, "s1")], Recorder::default());
        let options = RequestOptions::new(Method::POST)
            .header(AUTHORIZATION, HeaderValue::from_static("Bearer t"))
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .json(&json!({"qty": 2}))
            .unwrap();

        fetcher.fetch("/cart/items", options).await.unwrap();
        let (url, sent) = fetcher.sender().calls().remove(0);

        assert_eq!(url, "/cart/items?store_uuid=s1");
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.headers.get(AUTHORIZATION).unwrap(), "Bearer t");
        assert_eq!(sent.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(sent.headers.get(store_uuid_header()).unwrap(), "s1");
        assert_eq!(sent.body.as_deref(), Some(br#"{"qty":2}"#.as_slice()));
    }

    #[tokio::test]
    async fn caller_store_header_is_overwritten_not_duplicated() {
        let (fetcher, _) = fetcher_with(&[(SELECTED_STORE_UUID_KEY, "s1")], Recorder::default());
        let options = RequestOptions::default().header(store_uuid_header(), HeaderValue::from_static("stale"));

        fetcher.fetch("/products", options).await.unwrap();
        let (_, sent) = fetcher.sender().calls().remove(0);
        let values: Vec<_> = sent.headers.get_all(store_uuid_header()).iter().collect();
        assert_eq!(values, vec!["s1"]);
    }

    #[tokio::test]
    async fn upstream_error_passes_through() {
        let recorder = Recorder { fail_with: Some(503), ..Recorder::default() };
        let (fetcher, _) = fetcher_with(&[(SELECTED_STORE_UUID_KEY, "s1")], recorder);

        match fetcher.get("/products").await {
            Err(FetchError::Upstream(Unavailable(code))) => assert_eq!(code, 503),
            other => panic!("expected upstream error, got {other:?}"),
        }
        assert_eq!(fetcher.sender().calls().len(), 1);
    }
}
