//! whoamid entry point.
//!
//! Startup order mirrors the failure policy: logger first so every fatal is
//! logged structured, then configuration, identity snapshot, route table,
//! and finally the listener. Any failure before the listener opens exits
//! non-zero with no partial service. After that, only SIGINT/SIGTERM end
//! the process, via a graceful drain, with exit code 0.

use std::sync::Arc;

use tracing::{error, info, Level};

use whoamid::{app_router, shutdown_signal, Config, Error, Server, Snapshot};

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // Even a config failure deserves a structured log line.
    let level = config.as_ref().map(|c| c.log_level).unwrap_or(Level::DEBUG);
    tracing_subscriber::fmt()
        .json()
        .with_max_level(level)
        .init();

    let config = match config {
        Ok(config) => config,
        Err(cause) => fatal(cause),
    };

    if let Err(cause) = run(config).await {
        fatal(cause);
    }
}

async fn run(config: Config) -> Result<(), Error> {
    let snapshot = Arc::new(Snapshot::build()?);
    info!(
        hostname = %snapshot.hostname,
        rustc_version = %snapshot.runtime.version,
        uid = snapshot.uid,
        gid = snapshot.gid,
        pid = snapshot.pid,
        extra_envs = ?snapshot.extra_envs,
        "service configuration"
    );

    let router = app_router(snapshot)?;

    let server = Server::bind(config.addr).await?;
    info!(addr = %server.local_addr(), "starting http/1 server");
    server.serve(router, shutdown_signal()).await
}

fn fatal(cause: Error) -> ! {
    error!(error = %cause, "startup failed");
    std::process::exit(1);
}
