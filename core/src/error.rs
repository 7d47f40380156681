//! Error types for the HTTP client.
//!
//! # Design
//! Network and configuration failures abort a call and surface here as
//! distinct variants. Protocol anomalies such as a redirect whose `Location`
//! is not an absolute URI are not errors: the engine stops redirecting and
//! returns the response it already has.

use std::io;

/// Errors returned by `Client` operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `request()` was called before a target URI was set.
    #[error("no target URI configured")]
    UnconfiguredTarget,

    /// The configuration argument was not a key/value mapping, or a
    /// recognized key carried a value of the wrong type.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The target URI is not an absolute `http` URI with a host.
    #[error("invalid URI {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    /// Name resolution or TCP connect failed, including connect timeouts.
    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Writing the request or reading the response failed mid-connection.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True for the connection-failure class: connect, DNS, read and write
    /// errors, timeouts included.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Error::Connect { .. } | Error::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
