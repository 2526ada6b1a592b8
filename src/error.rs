//! Unified error type.
//!
//! Application-level outcomes (404, 418, 500) are expressed as HTTP
//! [`Response`](crate::Response) values, not as `Error`s. This type covers
//! what can actually fail out-of-band: resolving process identity at
//! startup, parsing the listen address, binding the listener, and route
//! registration. Everything here is a startup fatal — once the listener is
//! accepting, no `Error` is ever produced on the request path.

use std::net::SocketAddr;

use http::Method;
use thiserror::Error;

/// The error type returned by whoamid's fallible operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The OS could not report a hostname for the identity snapshot.
    #[error("hostname lookup failed: {0}")]
    Hostname(#[source] std::io::Error),

    /// `SERVER_ADDR` did not parse as `host:port` (or `:port`).
    #[error("invalid server address `{0}`")]
    Addr(String),

    /// Binding the listener failed (port taken, privileged port, ...).
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// A route pattern could not be parsed (e.g. an empty `{}` capture).
    #[error("invalid route pattern `{0}`")]
    InvalidPattern(String),

    /// The exact (method, pattern) pair was already registered.
    #[error("duplicate route: {method} {pattern}")]
    DuplicateRoute { method: Method, pattern: String },

    /// Two patterns could both match the same path. Rejected at
    /// registration time rather than resolved by precedence at request time.
    #[error("ambiguous route: {method} {pattern} overlaps registered {existing}")]
    AmbiguousRoute {
        method: Method,
        pattern: String,
        existing: String,
    },
}
