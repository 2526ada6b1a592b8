//! HTTP server lifecycle and request dispatch.
//!
//! The lifecycle is `Created → Listening → Draining → Stopped`:
//! [`Server::bind`] performs the only fallible transition (bind failure is
//! fatal to the caller), [`Server::serve`] accepts until the shutdown
//! future resolves, then drains. Draining is entered exactly once — the
//! shutdown future resolves on the first signal and later signals land on
//! handlers that are already installed and simply have no one left to
//! notify.
//!
//! Each accepted connection runs on its own tokio task. During drain no new
//! connections are accepted, in-flight requests may finish, and idle
//! keep-alive connections are closed, all bounded by a grace period; when
//! the grace expires, whatever is left is aborted.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// How long in-flight connections get to finish once draining starts.
const DRAIN_GRACE: Duration = Duration::from_secs(30);

/// The HTTP server, bound and listening.
pub struct Server {
    listener: TcpListener,
    addr: SocketAddr,
}

impl Server {
    /// Binds the listener: the `Created → Listening` transition.
    ///
    /// A bind failure (port taken, privileged port) is returned to the
    /// caller, where it is a startup fatal — no partial service is offered.
    pub async fn bind(addr: SocketAddr) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;

        // With port 0 the OS picks; report what was actually bound.
        let addr = listener.local_addr().map_err(|source| Error::Bind { addr, source })?;
        Ok(Self { listener, addr })
    }

    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accepts connections and dispatches them through `router` until
    /// `shutdown` resolves, then drains and returns.
    ///
    /// Pass [`shutdown_signal`] for SIGINT/SIGTERM handling, or any future
    /// of your own (tests use a channel).
    pub async fn serve(
        self,
        router: Router,
        shutdown: impl Future<Output = ()> + Send,
    ) -> Result<(), Error> {
        let router = Arc::new(router);

        // The drain flag is the single source of cancellation: flipped once
        // when shutdown fires, observed by the accept loop here and
        // advisorily by handlers via their request context.
        let (drain_tx, drain_rx) = watch::channel(false);

        let graceful = GracefulShutdown::new();
        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(shutdown);

        info!(addr = %self.addr, "listening");

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom: a shutdown signal
                // stops accepting immediately even with connections queued.
                biased;

                () = &mut shutdown => {
                    let _ = drain_tx.send(true);
                    info!(in_flight = tasks.len(), "shutdown signal received, draining");
                    break;
                }

                res = self.listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };
                    self.spawn_connection(stream, peer, &router, &drain_rx, &graceful, &mut tasks);
                }

                // Reap finished connection tasks so the JoinSet does not
                // grow without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain: close idle connections, let in-flight requests finish,
        // then wait for every connection task — all inside the grace.
        let drain = async {
            graceful.shutdown().await;
            while tasks.join_next().await.is_some() {}
        };
        if tokio::time::timeout(DRAIN_GRACE, drain).await.is_err() {
            warn!(grace = ?DRAIN_GRACE, "drain grace period expired, aborting remaining connections");
            tasks.shutdown().await;
        }

        info!("stopped");
        Ok(())
    }

    fn spawn_connection(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
        router: &Arc<Router>,
        drain_rx: &watch::Receiver<bool>,
        graceful: &GracefulShutdown,
        tasks: &mut tokio::task::JoinSet<()>,
    ) {
        let router = Arc::clone(router);
        let drain_rx = drain_rx.clone();

        // `service_fn` is called once per request on the connection, not
        // once per connection.
        let svc = service_fn(move |req| {
            let router = Arc::clone(&router);
            let drain = drain_rx.clone();
            async move { dispatch(router, req, peer, drain).await }
        });

        let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), svc);
        let conn = graceful.watch(conn);

        tasks.spawn(async move {
            // A write failure here means the response could not reach the
            // client; the status line may already be on the wire, so all
            // that is left is to log it.
            if let Err(e) = conn.await {
                error!(peer = %peer, "connection error: {e}");
            }
        });
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response.
///
/// The error type is [`Infallible`]: every failure becomes a status code
/// (404 for no matching route), so hyper never sees an error from here.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    peer: SocketAddr,
    drain: watch::Receiver<bool>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let span = tracing::info_span!("request", %request_id, %method, %path, %peer);

    let response = match router.lookup(&method, &path) {
        Some((handler, params)) => {
            let request = Request::new(method, path, params, request_id, drain);
            handler.call(request).instrument(span).await
        }
        None => {
            span.in_scope(|| debug!("no route matched"));
            Response::status(StatusCode::NOT_FOUND)
        }
    };

    Ok(response.into_http())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** (sent by process supervisors
/// and the Kubernetes control plane) and **SIGINT** (Ctrl-C, for local
/// dev). On other platforms only Ctrl-C is available. The handlers stay
/// installed for the life of the process, so signals arriving after the
/// first are absorbed rather than killing the drain.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // `pending()` never resolves — the SIGTERM arm is effectively disabled
    // on non-Unix platforms.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
