use crate::{
    errors::ErrorKind, http::request::Request, limits::ReqLimits, server::server_impl::Handler,
};
use std::{
    io::{self, BufReader, Read, Write},
    sync::Arc,
};
use tracing::{debug, info, warn};

/// One-shot request pipeline: parse, dispatch, serialize, write.
///
/// Works over any blocking byte stream. The [`Server`](crate::Server) feeds it TCP
/// sockets; tests feed it in-memory buffers.
///
/// # Examples
/// ```
/// use framed_http::{limits::ReqLimits, HttpConnection, Router};
/// use std::sync::Arc;
///
/// let router = Router::new().prefix("/echo/", framed_http::handlers::echo);
/// let conn = HttpConnection::new(Arc::new(router), ReqLimits::default());
///
/// let mut out = Vec::new();
/// conn.serve(&b"GET /echo/abc HTTP/1.1\r\n\r\n"[..], &mut out).unwrap();
///
/// assert_eq!(
///     out,
///     b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 3\r\n\r\nabc"
/// );
/// ```
pub struct HttpConnection<H: Handler> {
    handler: Arc<H>,
    req_limits: ReqLimits,
}

impl<H: Handler> Clone for HttpConnection<H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            req_limits: self.req_limits.clone(),
        }
    }
}

impl<H: Handler> HttpConnection<H> {
    #[inline]
    pub fn new(handler: Arc<H>, req_limits: ReqLimits) -> Self {
        Self {
            handler,
            req_limits,
        }
    }

    /// Serves a single request read from `reader`, answering on `writer`.
    ///
    /// A stream that ends before any byte, or a request that fails to parse, is
    /// closed without a response and reported as `Ok(())`. Only failures to
    /// deliver the response are returned.
    pub fn serve<R: Read, W: Write>(&self, reader: R, mut writer: W) -> io::Result<()> {
        let mut reader = BufReader::new(reader);

        let request = match Request::parse(&mut reader, &self.req_limits) {
            Ok(request) => request,
            Err(ErrorKind::StreamEnded) => {
                debug!("connection closed before a request");
                return Ok(());
            }
            Err(err) => {
                warn!(error = %err, "request rejected");
                return Ok(());
            }
        };

        let response = self.handler.handle(&request);
        info!(
            method = request.method(),
            target = request.target(),
            status = response.status().as_u16(),
            "served"
        );

        response.write(&mut writer)
    }
}
