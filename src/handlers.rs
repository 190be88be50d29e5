//! Handlers behind the stock route table.
//!
//! | Route              | Kind   | Handler                |
//! |--------------------|--------|------------------------|
//! | `/`                | exact  | [`home`]               |
//! | `/user-agent`      | exact  | [`user_agent`]         |
//! | `/echo/{value}`    | prefix | [`echo`]               |
//! | `/files/{name}`    | prefix | [`FileStore`]          |

use crate::{
    http::{request::Request, response::Response, types::StatusCode},
    server::{router::Router, server_impl::Handler},
};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::error;

pub const ECHO_PREFIX: &str = "/echo/";
pub const FILES_PREFIX: &str = "/files/";

/// Builds the stock route table, serving files out of `root`.
///
/// # Examples
/// ```
/// use framed_http::{handlers, Request};
///
/// let router = handlers::router("/tmp");
/// let resp = router.dispatch(&Request::new("GET", "/echo/hey"));
///
/// assert_eq!(resp.body(), b"hey");
/// ```
pub fn router<P: Into<PathBuf>>(root: P) -> Router {
    Router::new()
        .exact("/", home)
        .exact("/user-agent", user_agent)
        .prefix(ECHO_PREFIX, echo)
        .prefix(FILES_PREFIX, FileStore::new(root))
}

/// `200 OK`, no headers, no body.
#[inline]
pub fn home(_: &Request) -> Response {
    Response::new()
}

/// Everything after `/echo/`, verbatim, as `text/plain`.
///
/// The target is not percent-decoded and the query string is kept.
pub fn echo(request: &Request) -> Response {
    let value = request
        .target()
        .strip_prefix(ECHO_PREFIX)
        .unwrap_or_default();

    Response::new()
        .with_header("Content-Type", "text/plain")
        .with_sized_body(value)
}

/// The client's `User-Agent` as `text/plain`; an empty `200` when it sent none.
pub fn user_agent(request: &Request) -> Response {
    match request.header("User-Agent") {
        Some(agent) => Response::new()
            .with_header("Content-Type", "text/plain")
            .with_sized_body(agent),
        None => Response::new(),
    }
}

/// Flat file storage under `/files/{name}`.
///
/// - `GET` returns the file as `application/octet-stream`, or `404` if it does not exist.
/// - `POST` stores the request body, creating or truncating the file, and answers `201`.
/// - Any other method gets `405`.
///
/// Names are single path components: an empty name, `.`, `..`, or anything
/// containing `/` or `\` is answered with `400`. I/O failures other than a missing
/// file become `500` and are logged.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    #[inline]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, target: &str) -> Option<PathBuf> {
        let name = target.strip_prefix(FILES_PREFIX)?;

        match name {
            "" | "." | ".." => None,
            _ if name.contains(['/', '\\']) => None,
            _ => Some(self.root.join(name)),
        }
    }

    fn read(&self, path: &Path) -> Response {
        match fs::read(path) {
            Ok(contents) => Response::new()
                .with_header("Content-Type", "application/octet-stream")
                .with_sized_body(contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Response::from_status(StatusCode::NotFound)
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "file read failed");
                Response::from_status(StatusCode::InternalServerError)
            }
        }
    }

    fn write(&self, path: &Path, body: &[u8]) -> Response {
        match fs::write(path, body) {
            Ok(()) => Response::from_status(StatusCode::Created),
            Err(err) => {
                error!(path = %path.display(), error = %err, "file write failed");
                Response::from_status(StatusCode::InternalServerError)
            }
        }
    }
}

impl Handler for FileStore {
    fn handle(&self, request: &Request) -> Response {
        let Some(path) = self.path_for(request.target()) else {
            return Response::from_status(StatusCode::BadRequest);
        };

        match request.method() {
            "GET" => self.read(&path),
            "POST" => self.write(&path, request.body()),
            _ => Response::from_status(StatusCode::MethodNotAllowed),
        }
    }
}

#[cfg(test)]
mod route_tests {
    use super::*;
    use crate::tools::*;

    #[test]
    fn home_is_empty() {
        assert_eq!(str_op(&home(&Request::new("GET", "/")).to_bytes()), "HTTP/1.1 200 OK\r\n\r\n");
    }

    #[test]
    fn echo_values() {
        #[rustfmt::skip]
        let cases = [
            ("/echo/abc",         "abc",         "3"),
            ("/echo/",            "",            "0"),
            ("/echo/a/b/c",       "a/b/c",       "5"),
            ("/echo/x?y=1",       "x?y=1",       "5"),
            ("/echo/%20",         "%20",         "3"),
            ("/echo/héllo",       "héllo",       "6"),
        ];

        for (target, body, length) in cases {
            let resp = echo(&Request::new("GET", target));

            assert_eq!(resp.status(), StatusCode::Ok);
            assert_eq!(resp.headers().get("content-type"), Some("text/plain"));
            assert_eq!(resp.headers().get("content-length"), Some(length));
            assert_eq!(str_op(resp.body()), body);
        }
    }

    #[test]
    fn echo_wire() {
        let resp = echo(&Request::new("GET", "/echo/abc"));

        assert_eq!(
            str_op(&resp.to_bytes()),
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 3\r\n\r\nabc"
        );
    }

    #[test]
    fn user_agent_header() {
        let req = Request::new("GET", "/user-agent").with_header("user-agent", "foobar/1.2.3");
        let resp = user_agent(&req);

        assert_eq!(resp.body(), b"foobar/1.2.3");
        assert_eq!(resp.headers().get("Content-Length"), Some("12"));
        assert_eq!(resp.headers().get("Content-Type"), Some("text/plain"));

        let resp = user_agent(&Request::new("GET", "/user-agent"));
        assert_eq!(resp, Response::new());
    }

    #[test]
    fn stock_table() {
        let router = router("/nonexistent");

        #[rustfmt::skip]
        let cases = [
            ("/",                200),
            ("/echo/abc",        200),
            ("/user-agent",      200),
            ("/missing",         404),
            ("/echo",            404),
            ("/files/",          400),
        ];

        for (target, status) in cases {
            let resp = router.dispatch(&Request::new("GET", target));
            assert_eq!(resp.status().as_u16(), status, "{target}");
        }
    }
}
