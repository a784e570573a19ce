//! openexchangerates.org (OER) client for Rust.
//!
//! Deserializes OER JSON messages into native Rust types: latest and
//! historical rate maps, the currency listing and the publication timestamp.
//! Built on the generic GET layer in [`oxr_core`] (REST client, URL builder,
//! response cache, error policies).
//!
//! # Example
//!
//! ```rust,no_run
//! use oxr_client::OerClient;
//!
//! # async fn example() -> oxr_core::Result<()> {
//! let client = OerClient::builder()
//!     .api_key("your-api-key")
//!     .build()?;
//!
//! let rates = client.get_latest_rates().await?;
//! println!("USD/EUR: {:?}", rates.get("EUR"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;

pub use client::{
    DEFAULT_API_KEY, DEFAULT_OER_URL, OerClient, OerClientBuilder, OerConfig, rebase_currency,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
