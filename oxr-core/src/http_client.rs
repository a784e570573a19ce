//! HTTP GET client abstraction layer.
//!
//! Provides a unified read-only request interface with support for:
//! - Response caching keyed by request URL ([`HttpGetCache`])
//! - Pluggable deserialization of raw bytes into typed values
//!   ([`ResponseDeserializer`])
//! - Connection initializers applied before each request
//!   ([`ConnectionInitializer`])
//! - A per-client error policy deciding which failures propagate
//!   ([`ErrorPolicy`])
//! - Request/response debug output and structured tracing
//!
//! # Observability
//!
//! This module uses the `tracing` crate for structured logging. Key events:
//! - GET initiation with URL and cache outcome
//! - HTTP response status and body preview
//! - Suppressed errors with the active policy
//!
//! # Concurrency
//!
//! `call_get` is safe to invoke from many tasks, but at most one
//! fetch-cache-deserialize sequence runs at a time per client instance: the
//! whole call executes under one `tokio::sync::Mutex`, which removes
//! torn-cache-write races at the cost of throughput.

use crate::cache::{HttpGetCache, RawResponse};
use crate::error::{ContentError, Error, NetworkError, Result};
use reqwest::{Client, StatusCode, header::HeaderMap};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument, warn};

/// Default connect timeout: 6000 ms.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(6000);
/// Default read timeout: 10000 ms.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10000);

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// TCP connection timeout, applied once at client construction.
    pub connect_timeout: Duration,
    /// Response read timeout, applied per request.
    pub read_timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
    /// Whether to log request URLs and response bodies at debug level.
    pub verbose: bool,
    /// Error-handling policy; exactly one is active per client instance.
    pub error_policy: ErrorPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            user_agent: format!("oxr-rust/{}", env!("CARGO_PKG_VERSION")),
            verbose: false,
            error_policy: ErrorPolicy::default(),
        }
    }
}

/// Policy deciding whether failures raise to the caller or are swallowed into
/// an empty [`Response`].
///
/// Error classes: connection-class is transport failures and timeouts;
/// content-class is undeserializable payloads and 404s. A suppressed failure
/// yields `Ok(Response)` with [`Response::content`] of `None`, which callers
/// must treat as a valid "no data" outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Re-raise every failure to the caller with the original cause attached.
    #[default]
    PropagateAll,
    /// Swallow connection-class failures (network, timeout).
    SuppressConnection,
    /// Swallow content-class failures (content, not-found).
    SuppressContent,
    /// Swallow both classes.
    SuppressAll,
}

impl ErrorPolicy {
    /// True when this policy swallows `error` instead of propagating it.
    #[must_use]
    pub fn suppresses(&self, error: &Error) -> bool {
        match self {
            Self::PropagateAll => false,
            Self::SuppressConnection => error.is_connection_class(),
            Self::SuppressContent => error.is_content_class(),
            Self::SuppressAll => error.is_connection_class() || error.is_content_class(),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PropagateAll => "propagate-all",
            Self::SuppressConnection => "suppress-connection",
            Self::SuppressContent => "suppress-content",
            Self::SuppressAll => "suppress-all",
        };
        f.write_str(name)
    }
}

/// A typed HTTP response. Immutable once constructed by the [`RestClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<T> {
    content: Option<T>,
    status: u16,
    headers: HashMap<String, Vec<String>>,
}

impl<T> Response<T> {
    fn new(content: T, status: u16, headers: HashMap<String, Vec<String>>) -> Self {
        Self {
            content: Some(content),
            status,
            headers,
        }
    }

    /// An empty response standing in for a suppressed failure.
    fn suppressed() -> Self {
        Self {
            content: None,
            status: 0,
            headers: HashMap::new(),
        }
    }

    /// The deserialized content; `None` only when a suppressing
    /// [`ErrorPolicy`] swallowed a failure.
    pub fn content(&self) -> Option<&T> {
        self.content.as_ref()
    }

    /// Consumes the response, yielding the content.
    pub fn into_content(self) -> Option<T> {
        self.content
    }

    /// HTTP status code; `0` for a suppressed failure.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HashMap<String, Vec<String>> {
        &self.headers
    }
}

/// Converts raw response bytes, status and headers into a typed value.
///
/// The single extension point for turning a response into any result type;
/// fails with a content-class error when the body is unusable.
pub trait ResponseDeserializer<T>: Send + Sync {
    /// Deserializes `body` into a `T`.
    fn deserialize(
        &self,
        body: &[u8],
        status: u16,
        headers: &HashMap<String, Vec<String>>,
    ) -> Result<T>;
}

/// Deserializer for responses whose root must be a JSON object.
///
/// Fails with a [`ContentError`] when the body is empty, is not valid JSON,
/// or parses to a non-object root (array, scalar, null). On success the root
/// object is handed back unparsed into domain types; field extraction happens
/// one layer up.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonObjectDeserializer;

impl ResponseDeserializer<Map<String, Value>> for JsonObjectDeserializer {
    fn deserialize(
        &self,
        body: &[u8],
        _status: u16,
        _headers: &HashMap<String, Vec<String>>,
    ) -> Result<Map<String, Value>> {
        if body.is_empty() {
            return Err(ContentError::EmptyBody.into());
        }

        let value: Value = serde_json::from_slice(body).map_err(ContentError::Json)?;

        match value {
            Value::Object(map) => Ok(map),
            other => Err(ContentError::UnexpectedRoot {
                found: json_type_name(&other),
            }
            .into()),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Hook applied to a request before it is sent, in registration order.
pub trait ConnectionInitializer: Send + Sync + fmt::Debug {
    /// Applies this initializer to the request being built.
    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder;
}

/// Initializer setting the per-request read deadline.
///
/// The connect timeout is a client-construction knob in reqwest, so only the
/// read deadline travels with the request.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutInitializer {
    read_timeout: Duration,
}

impl TimeoutInitializer {
    /// Creates an initializer enforcing `read_timeout` on each request.
    pub fn new(read_timeout: Duration) -> Self {
        Self { read_timeout }
    }
}

impl ConnectionInitializer for TimeoutInitializer {
    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.timeout(self.read_timeout)
    }
}

/// Sink receiving the raw request URL and response body of every GET.
///
/// Side effect only; a sink can never affect control flow.
pub trait DebugSink: Send + Sync + fmt::Debug {
    /// Records one request/response pair.
    fn record(&self, url: &str, body: &[u8]);
}

/// Debug sink writing `url` and body text to any [`Write`] implementation.
pub struct WriterDebugSink<W: Write + Send> {
    writer: StdMutex<W>,
}

impl<W: Write + Send> WriterDebugSink<W> {
    /// Wraps `writer` as a debug sink.
    pub fn new(writer: W) -> Self {
        Self {
            writer: StdMutex::new(writer),
        }
    }
}

impl<W: Write + Send> DebugSink for WriterDebugSink<W> {
    fn record(&self, url: &str, body: &[u8]) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{url}");
            let _ = writer.write_all(body);
            let _ = writeln!(writer);
        }
    }
}

impl<W: Write + Send> fmt::Debug for WriterDebugSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterDebugSink").finish_non_exhaustive()
    }
}

/// HTTP GET client with caching, pluggable deserialization and a configurable
/// error policy.
#[derive(Debug)]
pub struct RestClient {
    client: Client,
    config: HttpConfig,
    cache: Option<Arc<dyn HttpGetCache>>,
    debug_sink: Option<Arc<dyn DebugSink>>,
    initializers: Vec<Arc<dyn ConnectionInitializer>>,
    call_lock: Mutex<()>,
}

impl RestClient {
    /// Creates a new client with the given configuration.
    ///
    /// A [`TimeoutInitializer`] for the configured read timeout is registered
    /// by default; further initializers run after it in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::network(format!("failed to build HTTP client: {e}")))?;

        let initializers: Vec<Arc<dyn ConnectionInitializer>> =
            vec![Arc::new(TimeoutInitializer::new(config.read_timeout))];

        Ok(Self {
            client,
            config,
            cache: None,
            debug_sink: None,
            initializers,
            call_lock: Mutex::new(()),
        })
    }

    /// Sets the response cache. `None` disables caching.
    pub fn set_cache(&mut self, cache: Option<Arc<dyn HttpGetCache>>) {
        self.cache = cache;
    }

    /// Sets the debug sink receiving request URLs and raw response bodies.
    pub fn set_debug_sink(&mut self, sink: Option<Arc<dyn DebugSink>>) {
        self.debug_sink = sink;
    }

    /// Sets the active error policy.
    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.config.error_policy = policy;
    }

    /// Registers a connection initializer; initializers run in registration
    /// order before each request.
    pub fn add_connection_initializer(&mut self, initializer: Arc<dyn ConnectionInitializer>) {
        self.initializers.push(initializer);
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Performs a GET against `url` and deserializes the response.
    ///
    /// Consults the cache first; on a miss, fetches over the network (applying
    /// every registered connection initializer), stores the raw response in
    /// the cache, then applies `deserializer`. Failures are handled per the
    /// active [`ErrorPolicy`]: propagated with the original cause, or
    /// swallowed into a `Response` whose content is `None`.
    ///
    /// Calls on one client instance are serialized; see the module docs.
    ///
    /// # Errors
    ///
    /// Under the default propagate-all policy: connection, timeout, content
    /// and not-found errors, each carrying the offending URL in its context.
    #[instrument(name = "call_get", skip(self, deserializer), fields(url = %url, policy = %self.config.error_policy))]
    pub async fn call_get<T>(
        &self,
        url: &str,
        deserializer: &dyn ResponseDeserializer<T>,
    ) -> Result<Response<T>> {
        let _guard = self.call_lock.lock().await;

        match self.fetch_and_deserialize(url, deserializer).await {
            Ok(response) => Ok(response),
            Err(e) if self.config.error_policy.suppresses(&e) => {
                warn!(
                    url = %url,
                    policy = %self.config.error_policy,
                    error = %e,
                    "error suppressed by policy, returning empty response"
                );
                Ok(Response::suppressed())
            }
            Err(e) => {
                error!(url = %url, error = %e, "GET failed");
                Err(e)
            }
        }
    }

    async fn fetch_and_deserialize<T>(
        &self,
        url: &str,
        deserializer: &dyn ResponseDeserializer<T>,
    ) -> Result<Response<T>> {
        let raw = self.fetch_raw(url).await?;

        if self.config.verbose {
            let preview: String = String::from_utf8_lossy(&raw.body).chars().take(200).collect();
            debug!(
                url = %url,
                status = raw.status,
                body_length = raw.body.len(),
                body_preview = %preview,
                "response body"
            );
        }
        if let Some(sink) = &self.debug_sink {
            sink.record(url, &raw.body);
        }

        let content = deserializer.deserialize(&raw.body, raw.status, &raw.headers)?;
        Ok(Response::new(content, raw.status, raw.headers.clone()))
    }

    /// Returns the raw response for `url`, from cache or network.
    ///
    /// Only successful responses are cached, so the cache can never replay an
    /// error.
    async fn fetch_raw(&self, url: &str) -> Result<Arc<RawResponse>> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(url) {
                debug!(url = %url, "cache hit, skipping network fetch");
                return Ok(hit);
            }
        }

        let mut request = self.client.get(url);
        for initializer in &self.initializers {
            request = initializer.apply(request);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = headers_to_map(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::network(format!("failed to read response body: {e}")))?
            .to_vec();

        debug!(url = %url, status = status.as_u16(), body_length = body.len(), "response received");

        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found(url.to_string()));
        }
        if !status.is_success() {
            return Err(NetworkError::RequestFailed {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).chars().take(200).collect(),
            }
            .into());
        }

        let raw = Arc::new(RawResponse {
            body,
            status: status.as_u16(),
            headers,
        });

        if let Some(cache) = &self.cache {
            cache.put(url, Arc::clone(&raw));
        }

        Ok(raw)
    }
}

/// Converts a reqwest `HeaderMap` into the header mapping carried by
/// [`Response`] and [`RawResponse`].
fn headers_to_map(headers: &HeaderMap) -> HashMap<String, Vec<String>> {
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in headers {
        map.entry(key.as_str().to_string())
            .or_default()
            .push(value.to_str().unwrap_or("").to_string());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_headers() -> HashMap<String, Vec<String>> {
        HashMap::new()
    }

    #[test]
    fn test_http_config_default() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_millis(6000));
        assert_eq!(config.read_timeout, Duration::from_millis(10000));
        assert_eq!(config.error_policy, ErrorPolicy::PropagateAll);
        assert!(!config.verbose);
    }

    #[test]
    fn test_rest_client_creation() {
        let client = RestClient::new(HttpConfig::default());
        assert!(client.is_ok());
        // The default read-timeout initializer is registered.
        assert_eq!(client.unwrap().initializers.len(), 1);
    }

    #[test]
    fn test_error_policy_propagate_all_suppresses_nothing() {
        let policy = ErrorPolicy::PropagateAll;
        assert!(!policy.suppresses(&Error::timeout("t")));
        assert!(!policy.suppresses(&Error::not_found("u")));
        assert!(!policy.suppresses(&Error::from(ContentError::EmptyBody)));
    }

    #[test]
    fn test_error_policy_suppress_connection() {
        let policy = ErrorPolicy::SuppressConnection;
        assert!(policy.suppresses(&Error::timeout("t")));
        assert!(policy.suppresses(&Error::network("refused")));
        assert!(!policy.suppresses(&Error::not_found("u")));
        assert!(!policy.suppresses(&Error::from(ContentError::EmptyBody)));
    }

    #[test]
    fn test_error_policy_suppress_content() {
        let policy = ErrorPolicy::SuppressContent;
        assert!(!policy.suppresses(&Error::timeout("t")));
        assert!(policy.suppresses(&Error::not_found("u")));
        assert!(policy.suppresses(&Error::from(ContentError::EmptyBody)));
    }

    #[test]
    fn test_error_policy_suppress_all() {
        let policy = ErrorPolicy::SuppressAll;
        assert!(policy.suppresses(&Error::timeout("t")));
        assert!(policy.suppresses(&Error::from(ContentError::EmptyBody)));
    }

    #[test]
    fn test_json_deserializer_accepts_object_root() {
        let map = JsonObjectDeserializer
            .deserialize(br#"{"rates": {"USD": 1.0}}"#, 200, &no_headers())
            .unwrap();
        assert!(map.contains_key("rates"));
    }

    #[test]
    fn test_json_deserializer_rejects_empty_body() {
        let err = JsonObjectDeserializer
            .deserialize(b"", 200, &no_headers())
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            Error::Content(c) if matches!(c.as_ref(), ContentError::EmptyBody)
        ));
    }

    #[test]
    fn test_json_deserializer_rejects_malformed_json() {
        let err = JsonObjectDeserializer
            .deserialize(b"{not json", 200, &no_headers())
            .unwrap_err();
        assert!(err.is_content_class());
    }

    #[test]
    fn test_json_deserializer_rejects_array_root() {
        let err = JsonObjectDeserializer
            .deserialize(b"[1, 2, 3]", 200, &no_headers())
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            Error::Content(c) if matches!(c.as_ref(), ContentError::UnexpectedRoot { found: "array" })
        ));
    }

    #[test]
    fn test_json_deserializer_rejects_scalar_root() {
        let err = JsonObjectDeserializer
            .deserialize(b"42", 200, &no_headers())
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            Error::Content(c) if matches!(c.as_ref(), ContentError::UnexpectedRoot { found: "number" })
        ));
    }

    #[test]
    fn test_writer_debug_sink_records_url_and_body() {
        let sink = WriterDebugSink::new(Vec::new());
        sink.record("http://x/latest.json", b"{}");
        let written = sink.writer.into_inner().unwrap();
        let text = String::from_utf8(written).unwrap();
        assert!(text.contains("http://x/latest.json"));
        assert!(text.contains("{}"));
    }

    #[test]
    fn test_response_accessors() {
        let response = Response::new(42u32, 200, no_headers());
        assert_eq!(response.content(), Some(&42));
        assert_eq!(response.status(), 200);
        assert_eq!(response.into_content(), Some(42));

        let empty: Response<u32> = Response::suppressed();
        assert!(empty.content().is_none());
        assert_eq!(empty.status(), 0);
    }
}
