//! # whoamid
//!
//! A minimal introspective HTTP service. It answers exactly three questions:
//!
//! | Route | Answer |
//! |---|---|
//! | `GET /health` | Is the process alive? `200 OK` |
//! | `GET /echo/{msg}` | Can it hear you? `202` with `{msg}` echoed back |
//! | `GET /whoami` | Who is it? `202` with a JSON identity snapshot |
//!
//! The identity snapshot is built once at startup and never mutated: host
//! name, build identity (version / commit / date), runtime identity (rustc
//! version, arch, OS, CPU count, live task count), process identity
//! (uid / gid / pid), and a caller-selected set of environment variables.
//!
//! Everything served is read-only per request, so there is no locking
//! anywhere on the request path — the snapshot sits behind an [`Arc`] and
//! every connection gets its own tokio task.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use whoamid::{app_router, Server, Snapshot};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), whoamid::Error> {
//!     let snapshot = Arc::new(Snapshot::build()?);
//!     let router = app_router(snapshot)?;
//!
//!     let server = Server::bind("0.0.0.0:8080".parse().unwrap()).await?;
//!     server.serve(router, whoamid::shutdown_signal()).await
//! }
//! ```
//!
//! Configuration comes from the environment: `SERVER_ADDR` (default
//! `:8080`), `LOG_LEVEL` (default `debug`), and `EXTRA_ENVS`, a
//! comma-separated list of variable names to surface in the snapshot.
//!
//! [`Arc`]: std::sync::Arc

mod config;
mod error;
mod handler;
mod handlers;
mod request;
mod response;
mod router;
mod server;
mod snapshot;

pub use config::Config;
pub use error::Error;
pub use handler::Handler;
pub use handlers::app_router;
pub use request::Request;
pub use response::{IntoResponse, Response};
pub use router::Router;
pub use server::{Server, shutdown_signal};
pub use snapshot::{RuntimeInfo, Snapshot};
