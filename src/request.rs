//! Per-request context.

use std::collections::HashMap;

use http::Method;
use tokio::sync::watch;
use uuid::Uuid;

/// The context handed to a handler for exactly one request.
///
/// Owned by the handling task and dropped when the handler returns. Carries
/// the matched path parameters, a correlation id (also bound to the request
/// tracing span), and an advisory drain signal inherited from the server's
/// shutdown context.
pub struct Request {
    method: Method,
    path: String,
    params: HashMap<String, String>,
    id: Uuid,
    drain: watch::Receiver<bool>,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        path: String,
        params: HashMap<String, String>,
        id: Uuid,
        drain: watch::Receiver<bool>,
    ) -> Self {
        Self { method, path, params, id, drain }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The correlation id attached to every log line for this request.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/echo/{msg}`, `req.param("msg")` on `/echo/hi` returns
    /// `Some("hi")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Whether the server has begun draining.
    ///
    /// Advisory only: in-flight handlers are never interrupted, but a
    /// handler doing open-ended work should check this and cut it short.
    pub fn is_draining(&self) -> bool {
        *self.drain.borrow()
    }

    /// Resolves when the server begins draining (immediately if it already
    /// has).
    pub async fn cancelled(&mut self) {
        // wait_for also covers the already-draining case
        let _ = self.drain.wait_for(|draining| *draining).await;
    }
}

#[cfg(test)]
pub(crate) fn test_request(params: &[(&str, &str)]) -> Request {
    let (_tx, rx) = watch::channel(false);
    Request::new(
        Method::GET,
        "/test".to_owned(),
        params
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect(),
        Uuid::new_v4(),
        rx,
    )
}
