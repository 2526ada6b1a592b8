//! Segment request router.
//!
//! Patterns are sequences of literal segments and `{name}` captures:
//! `/echo/{msg}` matches `/echo/hello` with `msg = "hello"`. Matching is
//! exact-segment-count — no prefix matching, no multi-segment wildcards.
//! A capture accepts any non-empty segment.
//!
//! Conflicts are rejected when a route is registered, not resolved by
//! precedence when a request arrives. Registering both `/echo/{msg}` and
//! `/echo/ping` is an error: a request for `/echo/ping` would match both,
//! and whichever rule picked the winner would be invisible at the call
//! site. Registration happens once at startup, so failing there is cheap
//! and loud.

use std::collections::HashMap;

use http::Method;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};

/// One segment of a parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
}

/// A parsed route pattern. Keeps the raw text for error reporting.
#[derive(Debug, Clone)]
struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    fn parse(pattern: &str) -> Result<Self, Error> {
        let stripped = pattern
            .strip_prefix('/')
            .ok_or_else(|| Error::InvalidPattern(pattern.to_owned()))?;

        let segments = stripped
            .split('/')
            .map(|seg| match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some("") => Err(Error::InvalidPattern(pattern.to_owned())),
                Some(name) => Ok(Segment::Capture(name.to_owned())),
                None => Ok(Segment::Literal(seg.to_owned())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { raw: pattern.to_owned(), segments })
    }

    /// Matches `path` against this pattern, collecting captures.
    ///
    /// Captures bind any non-empty segment; an empty segment only matches
    /// an empty literal (i.e. a trailing slash in the pattern itself).
    fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let path = path.strip_prefix('/')?;
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (pat, seg) in self.segments.iter().zip(&segments) {
            match pat {
                Segment::Literal(lit) if lit == seg => {}
                Segment::Capture(name) if !seg.is_empty() => {
                    params.insert(name.clone(), (*seg).to_owned());
                }
                _ => return None,
            }
        }
        Some(params)
    }

    /// Whether some path could match both `self` and `other`.
    ///
    /// Equal segment counts and, at every position, either equal literals
    /// or at least one capture.
    fn overlaps(&self, other: &Pattern) -> bool {
        self.segments.len() == other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| match (a, b) {
                (Segment::Literal(x), Segment::Literal(y)) => x == y,
                _ => true,
            })
    }
}

struct Route {
    pattern: Pattern,
    handler: BoxedHandler,
}

/// The application router.
///
/// Built once at startup; shared read-only across connection tasks
/// afterwards. The route table is small (single digits), so lookup is a
/// linear scan per method — ambiguity rejection guarantees at most one
/// pattern can match any given path.
pub struct Router {
    routes: HashMap<Method, Vec<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Registers a handler for a method + pattern pair.
    ///
    /// Fails fast on a duplicate pair or on any pattern that could compete
    /// with an already-registered one for the same path.
    ///
    /// ```rust
    /// # use whoamid::{Request, Response, Router};
    /// # async fn hello(_: Request) -> Response { Response::text("hi") }
    /// let router = Router::new()
    ///     .route(http::Method::GET, "/echo/{msg}", hello)
    ///     .unwrap();
    /// assert!(router.route(http::Method::GET, "/echo/ping", hello).is_err());
    /// ```
    pub fn route(
        mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
    ) -> Result<Self, Error> {
        let parsed = Pattern::parse(pattern)?;

        let routes = self.routes.entry(method.clone()).or_default();
        for existing in routes.iter() {
            if existing.pattern.raw == parsed.raw {
                return Err(Error::DuplicateRoute { method, pattern: parsed.raw });
            }
            if existing.pattern.overlaps(&parsed) {
                return Err(Error::AmbiguousRoute {
                    method,
                    pattern: parsed.raw,
                    existing: existing.pattern.raw.clone(),
                });
            }
        }

        routes.push(Route { pattern: parsed, handler: handler.into_boxed_handler() });
        Ok(self)
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        self.routes.get(method)?.iter().find_map(|route| {
            route.pattern.matches(path).map(|params| (route.handler.clone(), params))
        })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
