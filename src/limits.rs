//! Server configuration limits and timeouts
//!
//! Every limit has a conservative default. Override only the fields you care about:
//!
//! ```no_run
//! use framed_http::{Router, Server, limits::{ConnLimits, ReqLimits, ServerLimits}};
//! use tokio::net::TcpListener;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     Server::builder()
//!         .listener(TcpListener::bind("127.0.0.1:4221").await.unwrap())
//!         .handler(Router::new())
//!         .server_limits(ServerLimits {
//!             max_connections: 64,
//!             ..ServerLimits::default()
//!         })
//!         .connection_limits(ConnLimits {
//!             socket_read_timeout: Duration::from_secs(5),
//!             ..ConnLimits::default()
//!         })
//!         .request_limits(ReqLimits {
//!             body_size: 64 * 1024 * 1024,
//!             ..ReqLimits::default()
//!         })
//!         .build()
//!         .unwrap()
//!         .launch()
//!         .await;
//! }
//! ```

use std::time::Duration;

/// Controls server-level concurrency and admission.
///
/// # Connection management
/// ```text
///                            [------------]
///                            [ Tcp accept ]
///                            [------------]
///                                  ||
///                                  \/
/// [--------------]   Yes   /-----------------\   No   [-------------]
/// [ Add to queue ] <====== | Room in queue?  | =====> [ Sending 503 ]
/// [--------------]         \-----------------/        [-------------]
///        ||
///        \/
/// [ Worker: parse -> route -> write -> close ]
/// ```
///
/// Each worker serves one connection at a time, start to finish, so
/// `max_connections` is also the number of requests in flight.
#[derive(Debug, Clone)]
pub struct ServerLimits {
    /// Number of workers serving connections concurrently (default: `100`).
    pub max_connections: usize,

    /// Accepted sockets allowed to wait for a worker (default: `250`).
    ///
    /// Sockets accepted while the queue is full are handed to the 503 responders.
    pub max_pending_connections: usize,

    /// How idle workers wait for the next socket (default: `Sleep(50μs)`).
    pub wait_strategy: WaitStrategy,

    /// Tasks answering overflowed sockets with `503 Service Unavailable` (default: `1`).
    ///
    /// Set to 0 to drop overflowed sockets without a reply.
    pub count_503_handlers: usize,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            max_connections: 100,
            max_pending_connections: 250,
            wait_strategy: WaitStrategy::Sleep(Duration::from_micros(50)),
            count_503_handlers: 1,
        }
    }
}

/// Strategy for worker tasks waiting on an empty admission queue.
#[derive(Debug, Clone)]
pub enum WaitStrategy {
    /// Uses [`tokio::task::yield_now()`]. Lowest latency, keeps a core busy.
    Yield,
    /// Uses [`tokio::time::sleep()`].
    Sleep(Duration),
}

/// Per-socket deadlines.
///
/// The parser itself never times out; these are installed on the socket so a
/// stalled read or write fails the connection instead of pinning a worker.
#[derive(Debug, Clone)]
pub struct ConnLimits {
    /// Maximum wait for any single socket read (default: `5 seconds`).
    pub socket_read_timeout: Duration,

    /// Maximum wait for any single socket write (default: `5 seconds`).
    pub socket_write_timeout: Duration,
}

impl Default for ConnLimits {
    fn default() -> Self {
        Self {
            socket_read_timeout: Duration::from_secs(5),
            socket_write_timeout: Duration::from_secs(5),
        }
    }
}

/// Request parsing limits.
///
/// | Field         | Guards                                  | Error on violation |
/// |---------------|-----------------------------------------|--------------------|
/// | `line_size`   | request line and every header line      | `LineTooLong`      |
/// | `header_count`| number of lines in the header section   | `TooManyHeaders`   |
/// | `body_size`   | declared `Content-Length`               | `BodyTooLarge`     |
#[derive(Debug, Clone)]
pub struct ReqLimits {
    /// Longest accepted line in the request head, terminator included (default: `8 KiB`).
    pub line_size: usize,
    /// Most header lines read before giving up (default: `100`).
    pub header_count: usize,
    /// Largest accepted `Content-Length` (default: `16 MiB`).
    pub body_size: usize,
}

impl Default for ReqLimits {
    fn default() -> Self {
        Self {
            line_size: 8 * 1024,
            header_count: 100,
            body_size: 16 * 1024 * 1024,
        }
    }
}
