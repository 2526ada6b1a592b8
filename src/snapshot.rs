//! Process identity snapshot.
//!
//! Built exactly once at startup and shared read-only behind an `Arc` for
//! the life of the process. Nothing in here is ever mutated, so concurrent
//! readers need no locking.
//!
//! The JSON wire names (including `go` and `num_go_routine`) are contract:
//! existing consumers of the /whoami endpoint depend on them, so the Rust
//! runtime identity is published under the original keys.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::Error;

/// The environment variable naming which other variables to surface.
const EXTRA_ENVS_VAR: &str = "EXTRA_ENVS";

/// Runtime identity, published under the `go` key.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeInfo {
    pub arch: &'static str,
    pub os: &'static str,
    pub num_cpu: usize,
    /// Live async task count at snapshot time. Inherently racy — advisory
    /// telemetry only, never an input to any control decision.
    pub num_go_routine: usize,
    pub version: &'static str,
    pub compiler: &'static str,
}

/// Immutable process/runtime/build identity, built once at startup.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub hostname: String,
    pub app_version: &'static str,
    pub git_commit: &'static str,
    pub build_date: &'static str,
    #[serde(rename = "go")]
    pub runtime: RuntimeInfo,
    pub uid: u32,
    pub gid: u32,
    pub pid: u32,
    pub extra_envs: BTreeMap<String, String>,
}

impl Snapshot {
    /// Assembles the snapshot from the OS, the runtime, and the build.
    ///
    /// The only failure mode is an unresolvable hostname. Call once from
    /// `main`; share the result behind an `Arc`.
    pub fn build() -> Result<Self, Error> {
        let hostname = hostname::get()
            .map_err(Error::Hostname)?
            .to_string_lossy()
            .into_owned();

        let declared = std::env::var(EXTRA_ENVS_VAR).unwrap_or_default();
        let extra_envs = collect_extra_envs(&declared, |name| std::env::var(name).ok());
        debug!(count = extra_envs.len(), "collected extra environment variables");

        Ok(Self {
            hostname,
            app_version: env!("CARGO_PKG_VERSION"),
            git_commit: option_env!("GIT_COMMIT").unwrap_or(""),
            build_date: option_env!("BUILD_DATE").unwrap_or(""),
            runtime: RuntimeInfo {
                arch: std::env::consts::ARCH,
                os: std::env::consts::OS,
                num_cpu: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
                num_go_routine: live_task_count(),
                version: env!("RUSTC_VERSION"),
                compiler: "rustc",
            },
            uid: process_uid(),
            gid: process_gid(),
            pid: std::process::id(),
            extra_envs,
        })
    }
}

/// Builds the declared-variable mapping from a comma-separated name list.
///
/// Every declared name appears as a key; a lookup miss maps to `""`, never
/// to an omission. Empty names (an unset or trailing-comma list) are
/// skipped.
fn collect_extra_envs(
    declared: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> BTreeMap<String, String> {
    declared
        .split(',')
        .filter(|name| !name.is_empty())
        .map(|name| (name.to_owned(), lookup(name).unwrap_or_default()))
        .collect()
}

/// Live tokio task count, or 0 outside a runtime.
fn live_task_count() -> usize {
    tokio::runtime::Handle::try_current()
        .map(|handle| handle.metrics().num_alive_tasks())
        .unwrap_or(0)
}

#[cfg(unix)]
fn process_uid() -> u32 {
    // SAFETY: getuid is always successful and has no preconditions.
    unsafe { libc::getuid() }
}

#[cfg(unix)]
fn process_gid() -> u32 {
    // SAFETY: getgid is always successful and has no preconditions.
    unsafe { libc::getgid() }
}

#[cfg(not(unix))]
fn process_uid() -> u32 {
    0
}

#[cfg(not(unix))]
fn process_gid() -> u32 {
    0
}
