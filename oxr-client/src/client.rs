//! The openexchangerates.org domain client.
//!
//! [`OerClient`] holds one pre-built [`UrlBuilder`] per service endpoint, all
//! derived from a single base builder carrying the API key parameter, and maps
//! the generic JSON results of the REST layer into domain value types.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use oxr_core::cache::HttpGetCache;
use oxr_core::error::{ContentError, ContextExt, Result};
use oxr_core::http_client::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, DebugSink, ErrorPolicy, HttpConfig,
    JsonObjectDeserializer, RestClient,
};
use oxr_core::url_builder::UrlBuilder;
use oxr_core::time;
use serde_json::{Map, Value};
use tracing::debug;

/// Default URL for the OER service.
pub const DEFAULT_OER_URL: &str = "https://openexchangerates.org";

/// API key placeholder used when no key is configured. Requests made with it
/// will be rejected by the service.
pub const DEFAULT_API_KEY: &str = "CHANGE_ME_TO_YOUR_API_KEY";

/// Query parameter carrying the API key.
const API_KEY_PARAMETER: &str = "API_KEY";

/// Configuration for [`OerClient`].
#[derive(Debug, Clone)]
pub struct OerConfig {
    /// Base URL of the OER service.
    pub base_url: String,
    /// API key provisioned at openexchangerates.org.
    pub api_key: String,
    /// TCP connection timeout.
    pub connect_timeout: Duration,
    /// Response read timeout.
    pub read_timeout: Duration,
    /// Error-handling policy for the underlying REST client.
    pub error_policy: ErrorPolicy,
    /// Whether to log request/response bodies at debug level.
    pub verbose: bool,
    /// Optional response cache.
    pub cache: Option<Arc<dyn HttpGetCache>>,
    /// Optional sink receiving request URLs and raw response bodies.
    pub debug_sink: Option<Arc<dyn DebugSink>>,
}

impl Default for OerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OER_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            error_policy: ErrorPolicy::default(),
            verbose: false,
            cache: None,
            debug_sink: None,
        }
    }
}

/// Fluent builder for [`OerClient`].
///
/// # Example
///
/// ```rust,no_run
/// use oxr_client::OerClient;
/// use oxr_core::ErrorPolicy;
///
/// let client = OerClient::builder()
///     .api_key("your-api-key")
///     .error_policy(ErrorPolicy::SuppressContent)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct OerClientBuilder {
    config: OerConfig,
}

impl OerClientBuilder {
    /// Creates a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL of the OER service.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Sets the TCP connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the response read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Sets the error-handling policy.
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.config.error_policy = policy;
        self
    }

    /// Enables or disables verbose request/response logging.
    pub fn verbose(mut self, enabled: bool) -> Self {
        self.config.verbose = enabled;
        self
    }

    /// Sets the response cache.
    pub fn cache(mut self, cache: Arc<dyn HttpGetCache>) -> Self {
        self.config.cache = Some(cache);
        self
    }

    /// Sets the debug sink.
    pub fn debug_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.config.debug_sink = Some(sink);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn build(self) -> Result<OerClient> {
        OerClient::with_config(self.config)
    }
}

/// Pre-built endpoint URLs, all derived from one base builder so that an API
/// key change swaps every endpoint in a single assignment.
#[derive(Debug, Clone)]
struct Endpoints {
    base: UrlBuilder,
    currencies: UrlBuilder,
    latest: UrlBuilder,
}

impl Endpoints {
    fn derive(base_url: &str, api_key: &str) -> Self {
        let base = UrlBuilder::new(base_url).add_parameter(API_KEY_PARAMETER, api_key);
        let currencies = base.copy("currencies.json");
        let latest = base.copy("latest.json");
        Self {
            base,
            currencies,
            latest,
        }
    }
}

/// Typed client for the openexchangerates.org service.
///
/// All lookups are GETs against `{base}/{currencies|latest}.json` or
/// `{base}/historical/{yyyy-MM-dd}.json`, deserialized through the REST
/// layer's JSON object deserializer and converted here into domain maps.
#[derive(Debug)]
pub struct OerClient {
    rest: RestClient,
    base_url: String,
    endpoints: RwLock<Endpoints>,
}

impl OerClient {
    /// Creates a client with defaults: no cache, no debug sink, propagate-all
    /// errors, the well-known public endpoint and the placeholder API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_config(OerConfig::default())
    }

    /// Creates a client with defaults for everything except the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_cache(cache: Arc<dyn HttpGetCache>) -> Result<Self> {
        Self::with_config(OerConfig {
            cache: Some(cache),
            ..OerConfig::default()
        })
    }

    /// Creates a client from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_config(config: OerConfig) -> Result<Self> {
        let http_config = HttpConfig {
            connect_timeout: config.connect_timeout,
            read_timeout: config.read_timeout,
            verbose: config.verbose,
            error_policy: config.error_policy,
            ..HttpConfig::default()
        };

        let mut rest = RestClient::new(http_config)?;
        rest.set_cache(config.cache);
        rest.set_debug_sink(config.debug_sink);

        let endpoints = Endpoints::derive(&config.base_url, &config.api_key);

        Ok(Self {
            rest,
            base_url: config.base_url,
            endpoints: RwLock::new(endpoints),
        })
    }

    /// Creates a builder for fluent configuration.
    pub fn builder() -> OerClientBuilder {
        OerClientBuilder::new()
    }

    /// Replaces the API key.
    ///
    /// Every derived endpoint URL is rebuilt from one base value and swapped
    /// in a single assignment, so concurrent readers never observe endpoints
    /// disagreeing on the key.
    pub fn set_api_key(&self, api_key: &str) {
        let endpoints = Endpoints::derive(&self.base_url, api_key);
        *self
            .endpoints
            .write()
            .unwrap_or_else(PoisonError::into_inner) = endpoints;
    }

    fn endpoints(&self) -> Endpoints {
        self.endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Gets the latest currency rates.
    ///
    /// Returns a map from currency code to rate. Under a suppressing error
    /// policy a failed fetch yields an empty map instead of an error.
    ///
    /// # Errors
    ///
    /// Fails with the REST layer's error classes, and with a content error
    /// when the `"rates"` field is absent or malformed.
    pub async fn get_latest_rates(&self) -> Result<HashMap<String, f64>> {
        let url = self.endpoints().latest.render();
        let Some(json) = self.call_server(&url).await? else {
            return Ok(HashMap::new());
        };
        extract_rates(&json).with_context(|| format!("failed to extract rates from {url}"))
    }

    /// Gets currency rates for a specific date.
    ///
    /// The date is rendered as `yyyy-MM-dd` into
    /// `historical/<date>.json`; a date the service has no data for surfaces
    /// as a not-found error (or an empty map under a suppressing policy).
    ///
    /// # Errors
    ///
    /// Same classes as [`get_latest_rates`](Self::get_latest_rates).
    pub async fn get_rates(&self, date: NaiveDate) -> Result<HashMap<String, f64>> {
        let url = self
            .endpoints()
            .base
            .copy("historical")
            .append(format!("{}.json", time::ymd(date)))
            .render();
        let Some(json) = self.call_server(&url).await? else {
            return Ok(HashMap::new());
        };
        extract_rates(&json).with_context(|| format!("failed to extract rates from {url}"))
    }

    /// Gets the currency listing: a map from currency code to human-readable
    /// name. The response object itself is the mapping, with no nested
    /// wrapper.
    ///
    /// # Errors
    ///
    /// Fails with the REST layer's error classes, and with a content error
    /// when a listed value is not a string.
    pub async fn get_currencies(&self) -> Result<HashMap<String, String>> {
        let url = self.endpoints().currencies.render();
        let Some(json) = self.call_server(&url).await? else {
            return Ok(HashMap::new());
        };

        let mut currencies = HashMap::with_capacity(json.len());
        for (code, name) in &json {
            let name = name.as_str().ok_or_else(|| {
                ContentError::invalid_value(code.clone(), "currency name is not a string")
            })?;
            currencies.insert(code.clone(), name.to_string());
        }
        Ok(currencies)
    }

    /// Gets the publication timestamp of the latest rates.
    ///
    /// The service reports epoch seconds; the result is a UTC timestamp at
    /// millisecond resolution. `None` is returned only when a suppressing
    /// error policy swallowed the fetch.
    ///
    /// # Errors
    ///
    /// Fails with the REST layer's error classes, and with a content error
    /// when the `"timestamp"` field is absent or not an integer.
    pub async fn get_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        let url = self.endpoints().latest.render();
        let Some(json) = self.call_server(&url).await? else {
            return Ok(None);
        };

        let seconds = json
            .get("timestamp")
            .ok_or_else(|| ContentError::missing_field("timestamp"))?
            .as_i64()
            .ok_or_else(|| {
                ContentError::invalid_value("timestamp", "expected an integer")
            })?;

        time::from_epoch_seconds(seconds)
            .map(Some)
            .with_context(|| format!("invalid timestamp in {url}"))
    }

    /// Gets JSON from the server, or the cached copy if configured and
    /// available. `None` means a suppressing policy swallowed a failure.
    async fn call_server(&self, url: &str) -> Result<Option<Map<String, Value>>> {
        debug!(url = %url, "calling OER service");
        let response = self.rest.call_get(url, &JsonObjectDeserializer).await?;
        Ok(response.into_content())
    }
}

/// Converts a rate quoted against one base currency into a rate quoted
/// against another: `base_currency_rate * (1 / quote_currency_rate)`.
///
/// A zero quote rate produces infinity; guarding against it is the caller's
/// responsibility.
#[must_use]
pub fn rebase_currency(base_currency_rate: f64, quote_currency_rate: f64) -> f64 {
    base_currency_rate * (1.0 / quote_currency_rate)
}

/// Extracts the `"rates"` object into a currency→rate map.
fn extract_rates(json: &Map<String, Value>) -> Result<HashMap<String, f64>> {
    let rates = json
        .get("rates")
        .ok_or_else(|| ContentError::missing_field("rates"))?
        .as_object()
        .ok_or_else(|| ContentError::invalid_value("rates", "expected an object"))?;

    let mut map = HashMap::with_capacity(rates.len());
    for (code, rate) in rates {
        let rate = rate.as_f64().ok_or_else(|| {
            ContentError::invalid_value(code.clone(), "rate is not a number")
        })?;
        map.insert(code.clone(), rate);
    }
    Ok(map)
}
