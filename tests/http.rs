//! End-to-end tests over a live loopback server.
//!
//! Each test binds its own listener on port 0, drives it with reqwest, and
//! shuts it down through the same shutdown future `main` would use (backed
//! by a channel instead of process signals).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use whoamid::{app_router, Error, Request, Response, Router, Server, Snapshot};

struct TestServer {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<Result<(), Error>>,
}

impl TestServer {
    async fn spawn(router: Router) -> Self {
        let server = Server::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = server.local_addr();

        let (shutdown, mut rx) = watch::channel(false);
        let signal = async move {
            let _ = rx.wait_for(|fired| *fired).await;
        };

        let handle = tokio::spawn(server.serve(router, signal));
        Self { addr, shutdown, handle }
    }

    async fn spawn_app() -> (Self, Arc<Snapshot>) {
        let snapshot = Arc::new(Snapshot::build().unwrap());
        let server = Self::spawn(app_router(Arc::clone(&snapshot)).unwrap()).await;
        (server, snapshot)
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(self) {
        self.shutdown.send(true).unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn health_returns_200_ok() {
    let (server, _snapshot) = TestServer::spawn_app().await;

    let response = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");

    server.stop().await;
}

#[tokio::test]
async fn echo_reflects_the_captured_segment() {
    let (server, _snapshot) = TestServer::spawn_app().await;

    let response = reqwest::get(server.url("/echo/anything-else")).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.text().await.unwrap(), "anything-else");

    server.stop().await;
}

#[tokio::test]
async fn echo_ping_answers_as_a_teapot() {
    let (server, _snapshot) = TestServer::spawn_app().await;

    let response = reqwest::get(server.url("/echo/ping")).await.unwrap();
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(response.text().await.unwrap(), "pong");

    server.stop().await;
}

#[tokio::test]
async fn whoami_round_trips_process_identity() {
    let (server, snapshot) = TestServer::spawn_app().await;

    let response = reqwest::get(server.url("/whoami")).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        response.headers().get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/json")
    );

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["hostname"], snapshot.hostname.as_str());
    assert_eq!(body["uid"], snapshot.uid);
    assert_eq!(body["gid"], snapshot.gid);
    assert_eq!(body["pid"], snapshot.pid);
    assert_eq!(body["go"]["compiler"], "rustc");
    assert!(body["extra_envs"].is_object());

    server.stop().await;
}

#[tokio::test]
async fn unmatched_routes_are_404() {
    let (server, _snapshot) = TestServer::spawn_app().await;

    let response = reqwest::get(server.url("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Exact-segment-count matching: an empty capture segment is no match.
    let response = reqwest::get(server.url("/echo/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    server.stop().await;
}

async fn slow(_req: Request) -> Response {
    tokio::time::sleep(Duration::from_millis(300)).await;
    Response::text("done")
}

#[tokio::test]
async fn shutdown_drains_in_flight_requests_then_refuses_new_ones() {
    let router = Router::new().route(http::Method::GET, "/slow", slow).unwrap();
    let mut server = TestServer::spawn(router).await;

    let slow_url = server.url("/slow");
    let in_flight = tokio::spawn(async move { reqwest::get(slow_url).await });

    // Let the request reach the handler, then signal shutdown twice — the
    // second must be a no-op.
    tokio::time::sleep(Duration::from_millis(50)).await;
    server.shutdown.send(true).unwrap();
    // The receiver may already be gone once draining starts; either way the
    // second signal must not disturb the drain.
    let _ = server.shutdown.send(true);

    let response = in_flight.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "done");

    (&mut server.handle).await.unwrap().unwrap();

    // The listener is gone; fresh connections must fail.
    let refused = reqwest::Client::new().get(server.url("/slow")).send().await;
    assert!(refused.is_err());
}

#[tokio::test]
async fn bind_failure_surfaces_as_an_error() {
    let first = Server::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();

    let second = Server::bind(first.local_addr()).await;
    assert!(matches!(second, Err(Error::Bind { .. })));
}
