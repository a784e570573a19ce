//! Error handling for the `oxr` crates.
//!
//! Four error classes cover everything a read-only JSON GET can fail with:
//!
//! ```text
//! Error
//! ├── Network   - DNS/TCP/TLS failures, non-2xx statuses (via NetworkError)
//! ├── Timeout   - connect or read deadline exceeded
//! ├── Content   - empty body, malformed JSON, unexpected shape (via ContentError)
//! ├── NotFound  - server has no resource for the requested path
//! └── Context   - any of the above with an operation description attached
//! ```
//!
//! Design constraints:
//! - Strongly typed errors via `thiserror`, `#[non_exhaustive]` for API stability
//! - Large variants boxed, messages in `Cow<'static, str>` to avoid allocation
//!   for static strings
//! - No `unwrap()`/`expect()` on recoverable paths anywhere in the library
//!
//! # Adding context
//!
//! ```rust
//! use oxr_core::error::{ContextExt, Error, Result};
//!
//! fn lookup(url: &str) -> Result<()> {
//!     fetch(url).with_context(|| format!("failed to fetch {url}"))
//! }
//! # fn fetch(_: &str) -> Result<()> { Ok(()) }
//! ```

use std::borrow::Cow;
use std::error::Error as StdError;

use thiserror::Error;

/// Result type alias for all oxr operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum length of messages lifted from HTTP responses into errors.
const MAX_ERROR_MESSAGE_LEN: usize = 1024;

fn truncate_message(mut msg: String) -> String {
    if msg.len() > MAX_ERROR_MESSAGE_LEN {
        msg.truncate(MAX_ERROR_MESSAGE_LEN);
        msg.push_str("... (truncated)");
    }
    msg
}

/// Transport-layer errors, encapsulated so that `reqwest` types never leak
/// into the public API.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NetworkError {
    /// Server answered with a non-success HTTP status.
    #[error("request failed with status {status}: {message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message, truncated to a sane length.
        message: String,
    },

    /// TCP/TLS connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Opaque transport error preserving the underlying cause.
    #[error("transport error")]
    Transport(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

/// Errors raised while turning response bytes into a typed value.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ContentError {
    /// Server returned a zero-length body.
    #[error("server returned no data")]
    EmptyBody,

    /// Body is not valid JSON.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Body parsed, but the root value is not a JSON object.
    #[error("expected JSON object at response root, found {found}")]
    UnexpectedRoot {
        /// JSON type of the actual root value ("array", "string", ...).
        found: &'static str,
    },

    /// A field the caller depends on is absent.
    #[error("missing required field: {0}")]
    MissingField(Cow<'static, str>),

    /// A field is present but holds an unusable value.
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        /// Field name.
        field: Cow<'static, str>,
        /// What was wrong with it.
        message: Cow<'static, str>,
    },
}

impl ContentError {
    /// Creates a `MissingField` error. Accepts both `&'static str`
    /// (zero allocation) and `String`.
    pub fn missing_field(field: impl Into<Cow<'static, str>>) -> Self {
        Self::MissingField(field.into())
    }

    /// Creates an `InvalidValue` error.
    pub fn invalid_value(
        field: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The primary error type for the `oxr` crates.
///
/// Large variants are boxed to keep the enum small; see the module docs for
/// the class hierarchy.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Transport-layer failure.
    #[error("network error: {0}")]
    Network(Box<NetworkError>),

    /// Connect or read deadline exceeded.
    #[error("timeout: {0}")]
    Timeout(Cow<'static, str>),

    /// Response bytes could not be turned into the expected value.
    #[error("content error: {0}")]
    Content(Box<ContentError>),

    /// Server has no resource for the requested path (HTTP 404).
    #[error("not found: {0}")]
    NotFound(Cow<'static, str>),

    /// Error with an operation description attached, preserving the chain.
    #[error("{context}")]
    Context {
        /// What was being attempted.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Creates a network error from a plain message.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(Box::new(NetworkError::ConnectionFailed(msg.into())))
    }

    /// Creates a timeout error. Accepts both `&'static str` and `String`.
    pub fn timeout(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Creates a not-found error, typically carrying the offending URL.
    pub fn not_found(what: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(what.into())
    }

    /// Attaches context to an existing error.
    ///
    /// ```rust
    /// use oxr_core::error::Error;
    ///
    /// let err = Error::network("connection refused")
    ///     .context("failed to fetch latest rates");
    /// ```
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Iterates the error chain, penetrating `Context` layers.
    fn iter_chain(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |err| match err {
            Error::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        })
    }

    /// Returns the root cause, skipping `Context` layers.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        self.iter_chain().last().unwrap_or(self)
    }

    /// True for connection-class failures: transport errors and timeouts.
    #[must_use]
    pub fn is_connection_class(&self) -> bool {
        matches!(
            self.root_cause(),
            Error::Network(_) | Error::Timeout(_)
        )
    }

    /// True for content-class failures: undeserializable payloads and
    /// missing resources.
    #[must_use]
    pub fn is_content_class(&self) -> bool {
        matches!(
            self.root_cause(),
            Error::Content(_) | Error::NotFound(_)
        )
    }

    /// True when the root cause is a 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), Error::NotFound(_))
    }

    /// Generates a report with the full cause chain, one cause per line.
    #[must_use]
    pub fn report(&self) -> String {
        use std::fmt::Write;
        let mut report = String::new();
        report.push_str(&self.to_string());

        let mut current: Option<&(dyn StdError + 'static)> = self.source();
        while let Some(err) = current {
            let _ = write!(report, "\nCaused by: {err}");
            current = err.source();
        }
        report
    }
}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Error::Network(Box::new(e))
    }
}

impl From<ContentError> for Error {
    fn from(e: ContentError) -> Self {
        Error::Content(Box::new(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Content(Box::new(ContentError::Json(e)))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(Cow::Owned(truncate_message(e.to_string())))
        } else if e.is_connect() {
            Error::Network(Box::new(NetworkError::ConnectionFailed(
                truncate_message(e.to_string()),
            )))
        } else if let Some(status) = e.status() {
            Error::Network(Box::new(NetworkError::RequestFailed {
                status: status.as_u16(),
                message: truncate_message(e.to_string()),
            }))
        } else {
            Error::Network(Box::new(NetworkError::Transport(Box::new(e))))
        }
    }
}

/// Extension trait for ergonomic context attachment on `Result`.
pub trait ContextExt<T> {
    /// Wraps the error with a static context message.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Wraps the error with a lazily computed context message.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ContextExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_size() {
        // Boxed variants keep the enum compact.
        assert!(std::mem::size_of::<Error>() <= 56);
    }

    #[test]
    fn test_context_preserves_root_cause() {
        let err = Error::not_found("http://x/historical/1999-01-01.json")
            .context("failed to fetch historical rates")
            .context("getRates");

        assert!(err.is_not_found());
        assert!(err.is_content_class());
        assert!(!err.is_connection_class());
        assert!(matches!(err.root_cause(), Error::NotFound(_)));
    }

    #[test]
    fn test_report_includes_chain() {
        let err = Error::network("connection refused").context("failed to fetch latest rates");
        let report = err.report();
        assert!(report.starts_with("failed to fetch latest rates"));
        assert!(report.contains("Caused by: network error"));
    }

    #[test]
    fn test_classification() {
        assert!(Error::timeout("read deadline exceeded").is_connection_class());
        assert!(Error::network("dns failure").is_connection_class());
        assert!(Error::from(ContentError::EmptyBody).is_content_class());
        assert!(Error::not_found("x").is_content_class());
        assert!(!Error::not_found("x").is_connection_class());
    }

    #[test]
    fn test_content_error_display() {
        let err = ContentError::invalid_value("rates", "expected a number");
        assert_eq!(
            err.to_string(),
            "invalid value for 'rates': expected a number"
        );
        assert_eq!(
            ContentError::missing_field("timestamp").to_string(),
            "missing required field: timestamp"
        );
    }

    #[test]
    fn test_result_context_ext() {
        let res: Result<()> = Err(Error::from(ContentError::EmptyBody));
        let err = res.with_context(|| "deserializing latest.json").unwrap_err();
        assert!(matches!(err, Error::Context { .. }));
        assert!(err.is_content_class());
    }
}
