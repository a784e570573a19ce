//! oxr core library
//!
//! Generic read-only JSON HTTP layer the typed rate client is built on:
//! URL construction, response caching, pluggable deserialization and a
//! configurable error-handling policy. Reusable across any number of
//! read-only JSON HTTP endpoints.
//!
//! # Features
//!
//! - **Type Safety**: typed responses via a pluggable [`ResponseDeserializer`](http_client::ResponseDeserializer)
//! - **Caching**: optional [`HttpGetCache`](cache::HttpGetCache) consulted before any network I/O
//! - **Async/Await**: built on tokio and reqwest
//! - **Error Handling**: four-class error hierarchy with `thiserror`, policy-driven propagation
//!
//! # Example
//!
//! ```rust,no_run
//! use oxr_core::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let client = RestClient::new(HttpConfig::default())?;
//! let url = UrlBuilder::new("https://openexchangerates.org")
//!     .add_parameter("API_KEY", "secret")
//!     .copy("latest.json");
//!
//! let response = client.call_get(&url.render(), &JsonObjectDeserializer).await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod error;
pub mod http_client;
pub mod logging;
pub mod time;
pub mod url_builder;

pub use cache::{HttpGetCache, MemoryCache, RawResponse};
pub use error::{ContentError, ContextExt, Error, NetworkError, Result};
pub use http_client::{
    ConnectionInitializer, DebugSink, ErrorPolicy, HttpConfig, JsonObjectDeserializer, Response,
    ResponseDeserializer, RestClient, TimeoutInitializer, WriterDebugSink,
};
pub use url_builder::UrlBuilder;

/// Prelude module for convenient imports.
///
/// ```rust
/// use oxr_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cache::{HttpGetCache, MemoryCache, RawResponse};
    pub use crate::error::{ContentError, ContextExt, Error, NetworkError, Result};
    pub use crate::http_client::{
        ConnectionInitializer, DebugSink, ErrorPolicy, HttpConfig, JsonObjectDeserializer,
        Response, ResponseDeserializer, RestClient, TimeoutInitializer, WriterDebugSink,
    };
    pub use crate::logging::{LogConfig, LogFormat, LogLevel, init_logging, try_init_logging};
    pub use crate::time::{from_epoch_seconds, milliseconds, ymd};
    pub use crate::url_builder::UrlBuilder;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "oxr-core");
    }
}
