//! Immutable-with-copy request URL construction.
//!
//! A [`UrlBuilder`] holds a base endpoint, an ordered list of path segments and
//! a set of query parameters, and renders them to a request URL string.
//! Combinators consume or clone the builder; a base shared between derived
//! builders is never mutated in place, so pre-built endpoint URLs can be
//! derived from one base value and stay consistent.
//!
//! ```rust
//! use oxr_core::url_builder::UrlBuilder;
//!
//! let base = UrlBuilder::new("https://openexchangerates.org")
//!     .add_parameter("API_KEY", "secret");
//! let latest = base.copy("latest.json");
//!
//! assert_eq!(latest.render(), "https://openexchangerates.org/latest.json?API_KEY=secret");
//! // The base is untouched:
//! assert_eq!(base.render(), "https://openexchangerates.org?API_KEY=secret");
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// Builder for request URLs: base endpoint + path segments + query parameters.
///
/// Rendering is deterministic and idempotent for a given state: segments keep
/// insertion order, parameters are rendered in key order, and the path always
/// precedes the query regardless of the order combinators were called in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    base: String,
    segments: Vec<String>,
    parameters: BTreeMap<String, String>,
}

impl UrlBuilder {
    /// Creates a builder for `base` with no segments and no parameters.
    /// A trailing `/` on the base is trimmed.
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            base,
            segments: Vec::new(),
            parameters: BTreeMap::new(),
        }
    }

    /// Sets a query parameter, overwriting any previous value for `key`
    /// (last write wins).
    #[must_use]
    pub fn add_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns a new builder sharing this builder's base and parameters, with
    /// `segment` appended to the path. `self` is left unchanged.
    #[must_use]
    pub fn copy(&self, segment: impl Into<String>) -> Self {
        self.clone().append(segment)
    }

    /// Appends one more path segment.
    ///
    /// Segments are percent-encoded at render time, so a segment containing
    /// `/` cannot introduce additional path levels.
    #[must_use]
    pub fn append(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Renders the URL: `base[/seg1/seg2...][?k1=v1&k2=v2...]`.
    ///
    /// Parameter values and path segments are percent-encoded; an empty
    /// parameter map renders no `?`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut url = self.base.clone();

        for segment in &self.segments {
            url.push('/');
            url.push_str(&encode_segment(segment));
        }

        let mut first = true;
        for (key, value) in &self.parameters {
            url.push(if first { '?' } else { '&' });
            first = false;
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }

        url
    }
}

impl fmt::Display for UrlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Percent-encodes a path segment. `.` survives (needed for `latest.json`)
/// while `/` becomes `%2F`, keeping one segment exactly one path level.
fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
