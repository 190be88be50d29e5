use std::io;
use thiserror::Error;

/// Reasons a request could not be read off a stream.
///
/// None of these produce an HTTP response: without a valid request line there is
/// nothing to frame a reply against, so the connection is closed instead.
#[derive(Debug, PartialEq, Error)]
pub enum ErrorKind {
    /// The stream ended before a single byte arrived.
    ///
    /// Not a failure of the client; the connection is closed with a debug event only.
    #[error("stream ended before a request was received")]
    StreamEnded,

    #[error("request line must be `METHOD SP TARGET SP VERSION`")]
    MalformedRequestLine,
    #[error("request line is not valid UTF-8")]
    InvalidEncoding,
    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
    #[error("more than {limit} header lines")]
    TooManyHeaders { limit: usize },

    #[error("Content-Length is not a non-negative integer")]
    InvalidContentLength,
    #[error("declared body of {declared} bytes exceeds {limit} bytes")]
    BodyTooLarge { declared: usize, limit: usize },
    #[error("body ended after {received} of {expected} bytes")]
    TruncatedBody { expected: usize, received: usize },

    #[error("i/o error: {0}")]
    Io(IoError),
}

impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io(IoError(err))
    }
}

/// [`io::Error`] that compares by [`io::ErrorKind`].
#[derive(Debug, Error)]
#[error(transparent)]
pub struct IoError(pub io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

/// A [`ServerBuilder`](crate::ServerBuilder) was finalized without a required part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("the `listener` method must be called before `build`")]
    MissingListener,
    #[error("the `handler` method must be called before `build`")]
    MissingHandler,
}
