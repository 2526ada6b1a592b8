//! The three application handlers and the route table.
//!
//! Each handler is a pure function of its inputs: the request context plus,
//! for /whoami, the shared identity snapshot. No handler touches mutable
//! state.

use std::sync::Arc;

use http::{Method, StatusCode};
use tracing::{debug, error};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::snapshot::Snapshot;

/// Builds the application route table.
///
/// Fails only on a registration conflict, which is a programming error
/// caught before the listener ever opens.
pub fn app_router(snapshot: Arc<Snapshot>) -> Result<Router, Error> {
    Router::new()
        .route(Method::GET, "/health", health)?
        .route(Method::GET, "/echo/{msg}", echo)?
        .route(Method::GET, "/whoami", whoami(snapshot))
}

/// Liveness probe: `200 OK`, body `OK`.
///
/// Deliberately has no dependencies and no failure path. If this handler
/// cannot be reached, the process is down and the status code is moot.
pub async fn health(_req: Request) -> Response {
    debug!("health check");
    Response::text("OK")
}

/// Echoes the captured `msg` parameter back with `202 Accepted`.
///
/// `msg == "ping"` instead answers `418 I'm a Teapot` with body `pong` —
/// an intentional easter egg, not an error path.
pub async fn echo(req: Request) -> Response {
    debug!("echo");
    let msg = req.param("msg").unwrap_or("");

    if msg == "ping" {
        // easter egg
        return Response::builder().status(StatusCode::IM_A_TEAPOT).text("pong");
    }

    Response::builder().status(StatusCode::ACCEPTED).text(msg)
}

/// Identity handler, closed over the shared [`Snapshot`].
///
/// Answers `202 Accepted` with the JSON serialization of the snapshot. A
/// serialization failure downgrades to 500 and is logged with its cause;
/// with a fully owned, string-keyed snapshot this should never fire.
pub fn whoami(snapshot: Arc<Snapshot>) -> impl crate::handler::Handler {
    move |req: Request| {
        let snapshot = Arc::clone(&snapshot);
        async move {
            debug!("whoami");
            match serde_json::to_vec(&*snapshot) {
                Ok(body) => Response::builder().status(StatusCode::ACCEPTED).json(body),
                Err(cause) => {
                    error!(request_id = %req.id(), error = %cause, "snapshot serialization failed");
                    Response::status(StatusCode::INTERNAL_SERVER_ERROR)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_request;
    use std::collections::BTreeMap;

    use crate::snapshot::RuntimeInfo;

    fn sample_snapshot() -> Arc<Snapshot> {
        Arc::new(Snapshot {
            hostname: "worker-1".to_owned(),
            app_version: "0.1.0",
            git_commit: "",
            build_date: "",
            runtime: RuntimeInfo {
                arch: "x86_64",
                os: "linux",
                num_cpu: 4,
                num_go_routine: 1,
                version: "rustc 1.85.0",
                compiler: "rustc",
            },
            uid: 1000,
            gid: 100,
            pid: 77,
            extra_envs: BTreeMap::new(),
        })
    }

    #[tokio::test]
    async fn health_is_200_ok() {
        let response = health(test_request(&[])).await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.body(), b"OK");
    }

    #[tokio::test]
    async fn echo_accepts_and_reflects() {
        let response = echo(test_request(&[("msg", "hello")])).await;

        assert_eq!(response.status_code(), StatusCode::ACCEPTED);
        assert_eq!(response.body(), b"hello");
    }

    #[tokio::test]
    async fn echo_without_capture_is_empty_not_an_error() {
        let response = echo(test_request(&[])).await;

        assert_eq!(response.status_code(), StatusCode::ACCEPTED);
        assert_eq!(response.body(), b"");
    }

    #[tokio::test]
    async fn echo_ping_brews_tea() {
        let response = echo(test_request(&[("msg", "ping")])).await;

        assert_eq!(response.status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.body(), b"pong");
    }

    #[tokio::test]
    async fn whoami_serializes_the_snapshot() {
        use crate::handler::Handler;

        let handler = whoami(sample_snapshot()).into_boxed_handler();
        let response = handler.call(test_request(&[])).await;

        assert_eq!(response.status_code(), StatusCode::ACCEPTED);

        let value: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        let http = response.into_http();
        assert_eq!(
            http.headers().get("content-type").and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        assert_eq!(value["hostname"], "worker-1");
        assert_eq!(value["uid"], 1000);
        assert_eq!(value["gid"], 100);
        assert_eq!(value["pid"], 77);
    }

    #[tokio::test]
    async fn app_router_registers_cleanly() {
        assert!(app_router(sample_snapshot()).is_ok());
    }
}
