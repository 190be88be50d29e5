use crate::{
    errors::BuildError,
    http::{request::Request, response::Response, types::StatusCode},
    limits::{ConnLimits, ReqLimits, ServerLimits, WaitStrategy},
    server::connection::HttpConnection,
};
use crossbeam::queue::SegQueue;
use socket2::SockRef;
use std::{io, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::{spawn_blocking, yield_now},
    time::{sleep as tokio_sleep, timeout},
};
use tracing::{debug, error, warn};

/// Turns a parsed [`Request`] into a complete [`Response`].
///
/// Handlers never fail: collaborator errors are mapped to a status code inside
/// `handle`. A handler that sets a body also sets `Content-Length`.
///
/// Any `Fn(&Request) -> Response` closure or function is a handler.
///
/// # Examples
/// ```
/// use framed_http::{Handler, Request, Response, StatusCode};
///
/// struct Teapot;
///
/// impl Handler for Teapot {
///     fn handle(&self, _: &Request) -> Response {
///         Response::from_status(StatusCode::BadRequest).with_sized_body("short and stout")
///     }
/// }
///
/// fn hello(_: &Request) -> Response {
///     Response::new().with_sized_body("hello")
/// }
///
/// let req = Request::new("GET", "/");
/// assert_eq!(Teapot.handle(&req).status(), StatusCode::BadRequest);
/// assert_eq!(hello.handle(&req).body(), b"hello");
/// ```
pub trait Handler
where
    Self: Send + Sync + 'static,
{
    fn handle(&self, request: &Request) -> Response;
}

impl<F> Handler for F
where
    F: Fn(&Request) -> Response + Send + Sync + 'static,
{
    #[inline]
    fn handle(&self, request: &Request) -> Response {
        self(request)
    }
}

/// TCP front end for a [`Handler`].
///
/// Every accepted connection carries exactly one request: it is parsed, routed,
/// answered and closed. A bounded pool of workers does the serving; sockets that
/// arrive while the admission queue is full get `503 Service Unavailable`.
///
/// # Examples
///
/// ```no_run
/// use framed_http::{Request, Response, Server};
/// use tokio::net::TcpListener;
///
/// #[tokio::main]
/// async fn main() {
///     Server::builder()
///         .listener(TcpListener::bind("127.0.0.1:4221").await.unwrap())
///         .handler(|_: &Request| Response::new().with_sized_body("Hello world!"))
///         .build()
///         .unwrap()
///         .launch()
///         .await
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    stream_queue: TcpQueue,
    error_queue: TcpQueue,
    server_limits: ServerLimits,
}

impl Server {
    #[inline]
    pub fn builder<H: Handler>() -> ServerBuilder<H> {
        ServerBuilder {
            listener: None,
            handler: None,

            server_limits: None,
            connection_limits: None,
            request_limits: None,
        }
    }

    /// Address the listener is bound to.
    #[inline]
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever.
    ///
    /// Failed accepts (e.g. out of file descriptors) are retried after a growing delay.
    pub async fn launch(self) {
        let mut backoff = Backoff::new();

        loop {
            let value = match self.listener.accept().await {
                Ok(value) => {
                    backoff.reset();
                    value
                }
                Err(err) => {
                    let delay = backoff.next_delay();
                    warn!(error = %err, retry_in = ?delay, "accept failed");

                    tokio_sleep(delay).await;
                    continue;
                }
            };

            match self.stream_queue.len() < self.server_limits.max_pending_connections {
                true => self.stream_queue.push(value),
                false => self.error_queue.push(value),
            }
        }
    }

    #[inline]
    async fn get_stream(queue: &TcpQueue, wait: &WaitStrategy) -> (TcpStream, SocketAddr) {
        loop {
            if let Some(value) = queue.pop() {
                return value;
            }

            match wait {
                WaitStrategy::Yield => yield_now().await,
                WaitStrategy::Sleep(time) => tokio_sleep(*time).await,
            }
        }
    }
}

//

/// Builder for [`Server`].
///
/// `listener` and `handler` are required; every limit falls back to its `Default`.
pub struct ServerBuilder<H: Handler> {
    listener: Option<TcpListener>,
    handler: Option<Arc<H>>,

    server_limits: Option<ServerLimits>,
    connection_limits: Option<ConnLimits>,
    request_limits: Option<ReqLimits>,
}

impl<H: Handler> ServerBuilder<H> {
    #[inline]
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    #[inline]
    pub fn handler(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    #[inline]
    pub fn server_limits(mut self, limits: ServerLimits) -> Self {
        self.server_limits = Some(limits);
        self
    }

    #[inline]
    pub fn connection_limits(mut self, limits: ConnLimits) -> Self {
        self.connection_limits = Some(limits);
        self
    }

    #[inline]
    pub fn request_limits(mut self, limits: ReqLimits) -> Self {
        self.request_limits = Some(limits);
        self
    }

    /// Spawns the worker and 503 tasks and returns the server, ready to [`launch`](Server::launch).
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// [`BuildError`] when `listener` or `handler` was never set.
    pub fn build(self) -> Result<Server, BuildError> {
        let listener = self.listener.ok_or(BuildError::MissingListener)?;
        let handler = self.handler.ok_or(BuildError::MissingHandler)?;
        let limits: AllLimits = (
            self.server_limits.unwrap_or_default(),
            self.connection_limits.unwrap_or_default(),
            self.request_limits.unwrap_or_default(),
        );

        let stream_queue = Arc::new(SegQueue::new());
        let error_queue = Arc::new(SegQueue::new());

        let conn = HttpConnection::new(handler, limits.2.clone());
        for _ in 0..limits.0.max_connections {
            Self::spawn_worker(&stream_queue, &limits, conn.clone());
        }
        if limits.0.count_503_handlers != 0 {
            for _ in 0..limits.0.count_503_handlers {
                Self::spawn_alarmist(&error_queue, &limits);
            }
        } else {
            Self::spawn_quiet_alarmist(&error_queue, &limits);
        }

        Ok(Server {
            listener,
            stream_queue,
            error_queue,
            server_limits: limits.0,
        })
    }

    fn spawn_worker(queue: &TcpQueue, limits: &AllLimits, conn: HttpConnection<H>) {
        let queue = queue.clone();
        let (server_limits, conn_limits, _) = limits.clone();

        tokio::spawn(async move {
            loop {
                let (stream, addr) = Server::get_stream(&queue, &server_limits.wait_strategy).await;

                let stream = match into_blocking(stream, &conn_limits) {
                    Ok(stream) => stream,
                    Err(err) => {
                        error!(%addr, error = %err, "socket setup failed");
                        continue;
                    }
                };

                let conn = conn.clone();
                match spawn_blocking(move || conn.serve(&stream, &stream)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => debug!(%addr, error = %err, "response not delivered"),
                    Err(err) => error!(%addr, error = %err, "connection task failed"),
                }
            }
        });
    }

    fn spawn_alarmist(queue: &TcpQueue, limits: &AllLimits) {
        let queue = queue.clone();
        let (server_limits, conn_limits, _) = limits.clone();
        let response = Response::from_status(StatusCode::ServiceUnavailable)
            .with_header("Content-Length", "0")
            .to_bytes();

        tokio::spawn(async move {
            loop {
                let (mut stream, addr) =
                    Server::get_stream(&queue, &server_limits.wait_strategy).await;

                let sent =
                    reply_and_shutdown(&mut stream, &response, conn_limits.socket_write_timeout)
                        .await;

                match sent {
                    Ok(()) => {
                        debug!(%addr, "admission queue full, sent 503");
                        tokio::spawn(drain(stream));
                    }
                    Err(err) => debug!(%addr, error = %err, "503 not delivered"),
                }
            }
        });
    }

    fn spawn_quiet_alarmist(queue: &TcpQueue, limits: &AllLimits) {
        let queue = queue.clone();
        let (server_limits, ..) = limits.clone();

        tokio::spawn(async move {
            loop {
                let (stream, addr) = Server::get_stream(&queue, &server_limits.wait_strategy).await;

                debug!(%addr, "admission queue full, dropping connection");
                drop(stream);
            }
        });
    }
}

/// Longest time an answered overflow socket is drained before it is dropped.
const LINGER: Duration = Duration::from_millis(250);

/// Writes `response` and closes the write side.
async fn reply_and_shutdown(
    stream: &mut TcpStream,
    response: &[u8],
    write_timeout: Duration,
) -> io::Result<()> {
    timeout(write_timeout, stream.write_all(response))
        .await
        .map_err(|_| io::Error::from(io::ErrorKind::TimedOut))??;

    stream.shutdown().await
}

/// Discards unread request bytes until the peer closes or [`LINGER`] passes.
///
/// Dropping a socket with unread input sends a reset, which can destroy a reply the
/// peer has not read yet.
async fn drain(mut stream: TcpStream) {
    let mut sink = [0; 1024];

    let _ = timeout(LINGER, async {
        while matches!(stream.read(&mut sink).await, Ok(n) if n > 0) {}
    })
    .await;
}

/// Delay between failed accepts: doubles per consecutive failure up to a cap.
#[derive(Debug)]
struct Backoff {
    current: Duration,
}

impl Backoff {
    const MIN: Duration = Duration::from_millis(5);
    const MAX: Duration = Duration::from_secs(1);

    #[inline]
    fn new() -> Self {
        Self { current: Self::MIN }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(Self::MAX);
        delay
    }

    #[inline]
    fn reset(&mut self) {
        self.current = Self::MIN;
    }
}

/// Hands a Tokio socket over to blocking I/O with the configured deadlines.
fn into_blocking(stream: TcpStream, limits: &ConnLimits) -> io::Result<std::net::TcpStream> {
    let stream = stream.into_std()?;
    stream.set_nonblocking(false)?;

    let socket = SockRef::from(&stream);
    socket.set_read_timeout(Some(limits.socket_read_timeout))?;
    socket.set_write_timeout(Some(limits.socket_write_timeout))?;

    Ok(stream)
}

type TcpQueue = Arc<SegQueue<(TcpStream, SocketAddr)>>;
pub(crate) type AllLimits = (ServerLimits, ConnLimits, ReqLimits);

#[cfg(test)]
mod builder_tests {
    use super::*;
    use crate::Router;

    #[test]
    fn closure_handler() {
        let handler = |req: &Request| Response::new().with_sized_body(req.method().to_owned());

        let resp = handler.handle(&Request::new("PATCH", "/"));
        assert_eq!(resp.body(), b"PATCH");
        assert_eq!(resp.headers().get("Content-Length"), Some("5"));
    }

    #[test]
    fn missing_parts() {
        let result = Server::builder::<Router>().handler(Router::new()).build();
        assert!(matches!(result, Err(BuildError::MissingListener)));
    }

    #[tokio::test]
    async fn missing_handler() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let result = Server::builder::<Router>().listener(listener).build();

        assert!(matches!(result, Err(BuildError::MissingHandler)));
    }

    #[tokio::test]
    async fn into_blocking_applies_timeouts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let _client = TcpStream::connect(addr).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();

        let limits = ConnLimits {
            socket_read_timeout: Duration::from_millis(150),
            socket_write_timeout: Duration::from_millis(250),
        };
        let stream = into_blocking(stream, &limits).unwrap();

        assert_eq!(stream.read_timeout().unwrap(), Some(limits.socket_read_timeout));
        assert_eq!(stream.write_timeout().unwrap(), Some(limits.socket_write_timeout));
    }

    #[test]
    fn backoff_doubles_and_resets() {
        let mut backoff = Backoff::new();

        let delays: Vec<_> = (0..10).map(|_| backoff.next_delay()).collect();
        assert_eq!(delays[0], Duration::from_millis(5));
        assert_eq!(delays[1], Duration::from_millis(10));
        assert_eq!(delays[2], Duration::from_millis(20));
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(delays[9], Backoff::MAX);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Backoff::MIN);
    }

    #[tokio::test]
    async fn reply_survives_unread_request() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).await.unwrap();
        let (mut stream, _) = listener.accept().await.unwrap();

        client
            .write_all(b"POST /files/a HTTP/1.1\r\nContent-Length: 4\r\n\r\nbody")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let reply = b"HTTP/1.1 503 Service Unavailable\r\n\r\n";
        reply_and_shutdown(&mut stream, reply, Duration::from_secs(1))
            .await
            .unwrap();
        let drained = tokio::spawn(drain(stream));

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, reply);

        drop(client);
        drained.await.unwrap();
    }
}
