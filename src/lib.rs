//! framed_http - minimal HTTP/1.1 framing and routing
//!
//! One request per connection: the request is parsed off a byte stream, routed by
//! its target to a handler, and the handler's response is serialized back before
//! the connection is closed.
//!
//! # Layers
//!
//! - **Parsing**: [`Request::parse`] reads the request line, headers and a
//!   `Content-Length` framed body from any [`BufRead`](std::io::BufRead), under [`limits::ReqLimits`].
//! - **Routing**: [`Router`] tries exact and prefix rules in registration order and
//!   answers `404 Not Found` when none matches.
//! - **Serialization**: [`Response`] writes exactly the status line, headers and body
//!   it was given.
//! - **Serving**: [`HttpConnection`] ties the three together for one stream;
//!   [`Server`] runs it for every accepted TCP socket on a bounded worker pool.
//!
//! Keep-alive, chunked bodies, TLS and HTTP/2 are out of scope.
//!
//! # Examples
//!
//! Quick start:
//! ```no_run
//! use framed_http::{Request, Response, Router, Server};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::new()
//!         .exact("/", |_: &Request| Response::new().with_sized_body("Hello World!"))
//!         .prefix("/echo/", framed_http::handlers::echo);
//!
//!     Server::builder()
//!         .listener(TcpListener::bind("127.0.0.1:4221").await.unwrap())
//!         .handler(router)
//!         .build()
//!         .unwrap()
//!         .launch()
//!         .await;
//! }
//! ```
//! Without a socket:
//! ```
//! use framed_http::{limits::ReqLimits, Request, Response, Router, StatusCode};
//!
//! let router = Router::new().exact("/user-agent", framed_http::handlers::user_agent);
//!
//! let mut raw = &b"GET /user-agent HTTP/1.1\r\nUser-Agent: curl/8.0\r\n\r\n"[..];
//! let req = Request::parse(&mut raw, &ReqLimits::default()).unwrap();
//! let resp = router.dispatch(&req);
//!
//! assert_eq!(resp.status(), StatusCode::Ok);
//! assert_eq!(resp.body(), b"curl/8.0");
//! ```

pub(crate) mod http {
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
}
pub(crate) mod server {
    pub(crate) mod connection;
    pub(crate) mod router;
    pub(crate) mod server_impl;
}
pub(crate) mod errors;
pub mod handlers;
pub mod limits;

pub use crate::{
    errors::{BuildError, ErrorKind, IoError},
    http::{
        request::Request,
        response::Response,
        types::{HeaderMap, StatusCode},
    },
    server::{
        connection::HttpConnection,
        router::{MatchKind, Router},
        server_impl::{Handler, Server, ServerBuilder},
    },
};
