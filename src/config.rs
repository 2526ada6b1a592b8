//! Environment configuration.
//!
//! Three variables, all optional:
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `SERVER_ADDR` | `:8080` | Listen address; a bare `:port` binds all interfaces |
//! | `LOG_LEVEL` | `debug` | One of `debug` / `info` / `warn` / `error`, any case |
//! | `EXTRA_ENVS` | empty | Comma-separated variable names surfaced by /whoami |
//!
//! `EXTRA_ENVS` is read by the snapshot builder, not here.

use std::net::SocketAddr;

use tracing::Level;

use crate::error::Error;

const DEFAULT_ADDR: &str = ":8080";

/// Resolved process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub log_level: Level,
}

impl Config {
    /// Reads configuration from the environment.
    ///
    /// An unparseable `SERVER_ADDR` is the only failure; an unknown
    /// `LOG_LEVEL` silently falls back to `debug`.
    pub fn from_env() -> Result<Self, Error> {
        let raw_addr = std::env::var("SERVER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_owned());
        let raw_level = std::env::var("LOG_LEVEL").unwrap_or_default();

        Ok(Self {
            addr: parse_addr(&raw_addr)?,
            log_level: parse_log_level(&raw_level),
        })
    }
}

/// Parses `host:port`, accepting the bare `:port` shorthand for
/// all-interfaces.
fn parse_addr(raw: &str) -> Result<SocketAddr, Error> {
    let candidate = if raw.starts_with(':') {
        format!("0.0.0.0{raw}")
    } else {
        raw.to_owned()
    };
    candidate.parse().map_err(|_| Error::Addr(raw.to_owned()))
}

/// Maps a `LOG_LEVEL` string to a tracing level. Case-insensitive;
/// anything unrecognized (including empty) means debug.
fn parse_log_level(raw: &str) -> Level {
    match raw.to_ascii_lowercase().as_str() {
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::DEBUG,
    }
}
