use crate::{
    http::{request::Request, response::Response, types::StatusCode},
    server::server_impl::Handler,
};
use std::fmt;

/// How a route pattern is compared against the request-target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// The target equals the pattern.
    Exact,
    /// The target starts with the pattern.
    Prefix,
}

impl MatchKind {
    #[inline]
    pub fn matches(self, pattern: &str, target: &str) -> bool {
        match self {
            MatchKind::Exact => target == pattern,
            MatchKind::Prefix => target.starts_with(pattern),
        }
    }
}

struct Route {
    pattern: String,
    kind: MatchKind,
    handler: Box<dyn Handler>,
}

/// Ordered table of path rules.
///
/// Routes are tried in registration order and the first match wins; there is no
/// notion of specificity. Register narrow rules before the catch-alls that would
/// shadow them. A request no rule matches gets `404 Not Found` with an empty body.
///
/// Only the request-target is inspected. Methods are left to the handlers.
///
/// # Examples
/// ```
/// use framed_http::{MatchKind, Request, Response, Router};
///
/// let router = Router::new()
///     .exact("/", |_: &Request| Response::new())
///     .prefix("/echo/", |req: &Request| {
///         let value = req.target().trim_start_matches("/echo/");
///         Response::new().with_sized_body(value)
///     });
///
/// let resp = router.dispatch(&Request::new("GET", "/echo/abc"));
/// assert_eq!(resp.body(), b"abc");
///
/// let resp = router.dispatch(&Request::new("GET", "/nowhere"));
/// assert_eq!(resp.status().as_u16(), 404);
/// ```
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    #[inline]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Appends a rule. Overlapping or duplicate patterns are allowed.
    pub fn register<P, H>(&mut self, pattern: P, kind: MatchKind, handler: H) -> &mut Self
    where
        P: Into<String>,
        H: Handler,
    {
        self.routes.push(Route {
            pattern: pattern.into(),
            kind,
            handler: Box::new(handler),
        });
        self
    }

    /// Builder form of `register(pattern, MatchKind::Exact, handler)`.
    #[inline]
    pub fn exact<P: Into<String>, H: Handler>(mut self, pattern: P, handler: H) -> Self {
        self.register(pattern, MatchKind::Exact, handler);
        self
    }

    /// Builder form of `register(pattern, MatchKind::Prefix, handler)`.
    #[inline]
    pub fn prefix<P: Into<String>, H: Handler>(mut self, pattern: P, handler: H) -> Self {
        self.register(pattern, MatchKind::Prefix, handler);
        self
    }

    /// Runs the handler of the first matching rule.
    pub fn dispatch(&self, request: &Request) -> Response {
        let target = request.target();

        match self
            .routes
            .iter()
            .find(|route| route.kind.matches(&route.pattern, target))
        {
            Some(route) => route.handler.handle(request),
            None => Response::from_status(StatusCode::NotFound),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Handler for Router {
    #[inline]
    fn handle(&self, request: &Request) -> Response {
        self.dispatch(request)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| (r.kind, &r.pattern)))
            .finish()
    }
}

#[cfg(test)]
mod router_tests {
    use super::*;

    fn tagged(tag: &'static str) -> impl Handler {
        move |_: &Request| Response::new().with_sized_body(tag)
    }

    fn dispatch(router: &Router, target: &str) -> Response {
        router.dispatch(&Request::new("GET", target))
    }

    #[test]
    fn match_kind() {
        #[rustfmt::skip]
        let cases = [
            (MatchKind::Exact,  "/",        "/",            true),
            (MatchKind::Exact,  "/",        "/x",           false),
            (MatchKind::Exact,  "/files",   "/files/",      false),
            (MatchKind::Exact,  "/a?b",     "/a?b",         true),
            (MatchKind::Prefix, "/echo/",   "/echo/",       true),
            (MatchKind::Prefix, "/echo/",   "/echo/abc",    true),
            (MatchKind::Prefix, "/echo/",   "/echo",        false),
            (MatchKind::Prefix, "/echo/",   "/ECHO/abc",    false),
            (MatchKind::Prefix, "",         "/anything",    true),
        ];

        for (kind, pattern, target, expected) in cases {
            assert_eq!(kind.matches(pattern, target), expected, "{kind:?} {pattern} {target}");
        }
    }

    #[test]
    fn first_match_wins() {
        let router = Router::new()
            .prefix("/a", tagged("A"))
            .exact("/b", tagged("B"))
            .prefix("/a/c", tagged("C"));

        assert_eq!(dispatch(&router, "/a/c").body(), b"A");
        assert_eq!(dispatch(&router, "/a").body(), b"A");
        assert_eq!(dispatch(&router, "/b").body(), b"B");
    }

    #[test]
    fn duplicates_resolved_by_order() {
        let mut router = Router::new();
        router
            .register("/x", MatchKind::Exact, tagged("first"))
            .register("/x", MatchKind::Exact, tagged("second"));

        assert_eq!(router.len(), 2);
        assert_eq!(dispatch(&router, "/x").body(), b"first");
    }

    #[test]
    fn not_found() {
        let router = Router::new()
            .exact("/", tagged("home"))
            .exact("/user-agent", tagged("ua"))
            .prefix("/echo/", tagged("echo"))
            .prefix("/files/", tagged("files"));

        for target in ["/missing", "/echo", "/files", "/user-agent/", "//"] {
            let resp = dispatch(&router, target);

            assert_eq!(resp.status(), StatusCode::NotFound, "{target}");
            assert_eq!(resp.status().reason_phrase(), "Not Found");
            assert!(resp.headers().is_empty());
            assert!(resp.body().is_empty());
        }
    }

    #[test]
    fn empty_table() {
        let router = Router::new();

        assert!(router.is_empty());
        assert_eq!(dispatch(&router, "/").status(), StatusCode::NotFound);
    }

    #[test]
    fn ignores_method() {
        let router = Router::new().exact("/", tagged("home"));

        for method in ["GET", "POST", "DELETE"] {
            let resp = router.dispatch(&Request::new(method, "/"));
            assert_eq!(resp.body(), b"home");
        }
    }

    #[test]
    fn nested_router() {
        let inner = Router::new().prefix("/api/v1/", tagged("v1"));
        let outer = Router::new().prefix("/api/", inner);

        assert_eq!(dispatch(&outer, "/api/v1/users").body(), b"v1");
        assert_eq!(dispatch(&outer, "/api/v2/users").status(), StatusCode::NotFound);
    }

    #[test]
    fn debug_lists_patterns() {
        let router = Router::new().exact("/", tagged("")).prefix("/echo/", tagged(""));

        assert_eq!(format!("{router:?}"), r#"[(Exact, "/"), (Prefix, "/echo/")]"#);
    }
}
