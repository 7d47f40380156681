//! Minimal blocking HTTP/1.1 client with redirect following and a disk cache.
//!
//! # Overview
//! `Client` sends one request per connection over a plain TCP socket, reads
//! until the server closes, follows absolute `Location` redirects up to a
//! configured limit, and optionally caches the final raw response on disk
//! keyed by the requested URI.
//!
//! # Design
//! - Everything is synchronous; each hop is a blocking connect, write, and
//!   read-to-EOF bounded by the configured timeout.
//! - Header composition (`Client::build_request`) is separated from I/O.
//! - `Response` never fails to parse; malformed input degrades to status 0.
//! - Network and configuration failures are `Err`, never an empty success.
//!
//! ```no_run
//! use easyhttp_core::Client;
//! use serde_json::json;
//!
//! let mut client = Client::with_uri("http://example.com/foaf.rdf");
//! client
//!     .configure(json!({"max_redirects": 3, "cache_dir": "/tmp/rdf-cache"}))?
//!     .set_header("Accept", "application/rdf+xml");
//! let response = client.get()?;
//! println!("{} after {} redirects", response.status(), client.redirect_count());
//! # Ok::<(), easyhttp_core::Error>(())
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod http;

pub use cache::CacheStore;
pub use client::{Client, RequestTarget};
pub use config::Config;
pub use error::{Error, Result};
pub use headers::{HeaderTable, HeaderValue};
pub use http::{HttpMethod, HttpRequest, Response};
