//! HTTP page fetcher.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use log::warn;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use super::FetchResponse;
use super::PageFetcher;
use super::PageQuery;
use super::RetryPolicy;
use crate::error::FetchError;

/// Fetches pages from an HTTP endpoint following the catalog contract.
///
/// Requests look like
/// `GET {base_url}/{resource}?limit=5&offset=10&filterBy={json}` and the
/// response body is `{"<resource>": [row, ...]}`. An optional boolean
/// `hasMore` field in the body is passed on as the next-page signal.
///
/// Cheap to clone; clones share the HTTP connection pool.
///
/// # Example
///
/// ```ignore
/// use tablepager_lib::fetch::{HttpFetcher, RetryPolicy};
///
/// let fetcher: HttpFetcher<Product> = HttpFetcher::new("http://127.0.0.1:3000/api")?
///     .with_retry(RetryPolicy::new(2, Duration::from_millis(100)))
///     .with_timeout(Duration::from_secs(5));
/// ```
pub struct HttpFetcher<R> {
    inner: Arc<HttpFetcherInner>,
    _rows: PhantomData<fn() -> R>,
}

struct HttpFetcherInner {
    base_url: Url,
    http_client: Client,
    timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl<R> HttpFetcher<R> {
    /// Creates a fetcher for the given base URL with default retries.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            inner: Arc::new(HttpFetcherInner {
                base_url,
                http_client: Client::new(),
                timeout: None,
                retry: RetryPolicy::default(),
            }),
            _rows: PhantomData,
        })
    }

    fn rebuild(self, f: impl FnOnce(&mut HttpFetcherInner)) -> Self {
        let mut inner = HttpFetcherInner {
            base_url: self.inner.base_url.clone(),
            http_client: self.inner.http_client.clone(),
            timeout: self.inner.timeout,
            retry: self.inner.retry,
        };
        f(&mut inner);
        Self {
            inner: Arc::new(inner),
            _rows: PhantomData,
        }
    }

    /// Sets the retry behavior.
    pub fn with_retry(self, retry: RetryPolicy) -> Self {
        self.rebuild(|inner| inner.retry = retry)
    }

    /// Sets a per-request timeout.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.rebuild(|inner| inner.timeout = Some(timeout))
    }

    /// Sets a custom HTTP client.
    pub fn with_http_client(self, client: Client) -> Self {
        self.rebuild(|inner| inner.http_client = client)
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Builds the request URL for `query`.
    pub fn url_for(&self, query: &PageQuery) -> Result<String, FetchError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .push(&query.resource);
        url.set_query(None);

        let mut url = format!(
            "{}?limit={}&offset={}",
            url, query.cursor.limit, query.cursor.offset
        );

        let filter_by = query
            .filters
            .to_query_param()
            .map_err(|e| FetchError::InvalidUrl(format!("filterBy: {}", e)))?;
        if let Some(filter_by) = filter_by {
            url.push_str("&filterBy=");
            url.push_str(&urlencoding::encode(&filter_by));
        }

        Ok(url)
    }
}

impl<R: DeserializeOwned> HttpFetcher<R> {
    async fn fetch_once(&self, url: &str, resource: &str) -> Result<FetchResponse<R>, FetchError> {
        let mut request = self.inner.http_client.get(url);
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(FetchError::http(status.as_u16(), body));
        }

        parse_body(&body, resource)
    }

    fn map_send_error(&self, error: reqwest::Error) -> FetchError {
        match self.inner.timeout {
            Some(timeout) if error.is_timeout() => FetchError::Timeout(timeout),
            _ => FetchError::Network(error),
        }
    }
}

/// Extracts rows and the optional `hasMore` flag from a response body.
fn parse_body<R: DeserializeOwned>(body: &str, resource: &str) -> Result<FetchResponse<R>, FetchError> {
    let mut value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::parse_with_body(e.to_string(), body))?;

    let has_more = value.get("hasMore").and_then(serde_json::Value::as_bool);
    let rows = value
        .get_mut(resource)
        .map(serde_json::Value::take)
        .ok_or_else(|| FetchError::parse_with_body(format!("missing `{}` in response", resource), body))?;
    let rows: Vec<R> =
        serde_json::from_value(rows).map_err(|e| FetchError::parse_with_body(e.to_string(), body))?;

    Ok(FetchResponse { rows, has_more })
}

#[async_trait]
impl<R> PageFetcher<R> for HttpFetcher<R>
where
    R: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self, query: &PageQuery) -> Result<FetchResponse<R>, FetchError> {
        let url = self.url_for(query)?;
        let mut attempt = 0;

        loop {
            debug!("[fetch] GET {} (attempt {})", url, attempt + 1);
            let error = match self.fetch_once(&url, &query.resource).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };
            let Some(delay) = self.inner.retry.backoff(&error, attempt) else {
                return Err(error);
            };
            warn!("[fetch] {} failed: {}; retrying in {:?}", url, error, delay);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl<R> Clone for HttpFetcher<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _rows: PhantomData,
        }
    }
}

impl<R> std::fmt::Debug for HttpFetcher<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .field("retry", &self.inner.retry)
            .finish()
    }
}
