//! Response caching for HTTP GETs.
//!
//! A [`HttpGetCache`] maps a request URL to the raw response that was last
//! fetched for it. The [`RestClient`](crate::http_client::RestClient) consults
//! the cache before touching the network and stores successful responses after
//! a live fetch; a cache hit carries the same bytes, status and headers a live
//! fetch would, so the deserializer cannot tell the two apart.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// A raw HTTP response: everything needed to rebuild a typed
/// [`Response`](crate::http_client::Response) without a network round trip.
///
/// Serializable so that cache implementations can persist entries across
/// process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResponse {
    /// Response body bytes.
    pub body: Vec<u8>,
    /// HTTP status code.
    pub status: u16,
    /// Response headers; a header may carry multiple values.
    pub headers: HashMap<String, Vec<String>>,
}

/// Pluggable store consulted before and updated after a network GET.
///
/// Implementations must tolerate concurrent reads; writes are serialized by
/// the `RestClient`'s call lock, so a cache never sees two concurrent `put`s
/// from the same client instance.
pub trait HttpGetCache: Send + Sync + fmt::Debug {
    /// Returns the cached response for `url`, if any.
    fn get(&self, url: &str) -> Option<Arc<RawResponse>>;

    /// Stores the response for `url`, replacing any previous entry.
    fn put(&self, url: &str, response: Arc<RawResponse>);
}

/// Unbounded in-memory cache keyed by request URL.
///
/// Suitable for the small, slow-moving endpoint set of a rate service, where
/// the number of distinct URLs is bounded by the number of queried dates.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Arc<RawResponse>>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached responses.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// True when nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all cached responses.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

impl HttpGetCache for MemoryCache {
    fn get(&self, url: &str) -> Option<Arc<RawResponse>> {
        self.entries.read().ok()?.get(url).cloned()
    }

    fn put(&self, url: &str, response: Arc<RawResponse>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(url.to_string(), response);
        }
    }
}
