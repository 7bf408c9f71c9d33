//! reqwest integration for stashbox.
//!
//! [`RemoteRequest::send_json`] sends a `reqwest` request and classifies the
//! response the way [`Fetcher`](stashbox::Fetcher) expects:
//!
//! | response | result |
//! |---|---|
//! | 2xx | `Ok(Remote { value, retry_after })`, JSON-decoded body |
//! | 429 | `Err(RemoteError::RateLimited { retry_after })` |
//! | other status | `Err(RemoteError::Failed { status: Some(code), message: body })` |
//! | transport or decode error | `Err(RemoteError::Failed { status: None, .. })` |
//!
//! `retry_after` comes from the `Retry-After` header, read as a number of
//! seconds.
//!
//! ```no_run
//! use std::time::Duration;
//! use stashbox::{Fetcher, Operation, Throttler, TtlCache};
//! use stashbox_reqwest::RemoteRequest;
//!
//! # async fn run() -> Result<(), stashbox::FetchError> {
//! let client = reqwest::Client::new();
//! let fetcher = Fetcher::new(TtlCache::in_memory("repos"), Throttler::new());
//!
//! let repo: serde_json::Value = fetcher
//!     .fetch_cached("cargo", Duration::from_secs(600), Operation::Read, || {
//!         client
//!             .get("https://api.github.com/repos/rust-lang/cargo")
//!             .header("User-Agent", "stashbox")
//!             .send_json()
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]

mod request;
mod retry_after;

pub use request::{RemoteRequest, classify_response};
pub use retry_after::parse_retry_after;
