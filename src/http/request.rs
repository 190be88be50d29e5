use crate::{
    errors::ErrorKind,
    http::types::{self, HeaderMap},
    limits::ReqLimits,
};
use memchr::{memchr_iter, memmem};
use std::io::{BufRead, Read};

/// A parsed HTTP/1.1 request.
///
/// Created once per connection by [`Request::parse`] and never modified afterwards.
///
/// # Input format
///
/// - `SP`: ASCII space (0x20)
/// - `EOL`: `"\r\n"`; a bare `"\n"` is also accepted
///
/// ## Request line
/// ```text
/// [METHOD] SP [TARGET] SP [VERSION] EOL
/// ```
/// The line must split on `SP` into exactly three non-empty fields, which are kept
/// verbatim. A target containing a literal space therefore fails to parse.
///
/// ## Headers
/// ```text
/// [NAME]: SP [VALUE] EOL
/// ```
/// Each line is trimmed, then split at the first `": "`. Lines without that separator
/// are skipped, not rejected, and so are lines that are not valid UTF-8. A value may
/// itself contain `": "`.
///
/// ## End of headers
/// ```text
/// EOL
/// ```
/// The end of the stream also ends the header section.
///
/// ## Body
///
/// Only bodies framed by `Content-Length` are read. Without that header, or when it
/// is `0`, the body is empty and nothing further is read from the stream.
///
/// **Not supported**: `Transfer-Encoding: chunked`, bodies delimited by connection
/// close, `Expect: 100-continue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    target: String,
    version: String,

    headers: HeaderMap,
    body: Vec<u8>,
}

impl Request {
    /// Builds an `HTTP/1.1` request by hand, without a body or headers.
    ///
    /// # Examples
    /// ```
    /// use framed_http::Request;
    ///
    /// let req = Request::new("GET", "/echo/abc")
    ///     .with_header("User-Agent", "curl/8.0")
    ///     .with_body("");
    ///
    /// assert_eq!(req.target(), "/echo/abc");
    /// assert_eq!(req.header("user-agent"), Some("curl/8.0"));
    /// ```
    pub fn new<M, T>(method: M, target: T) -> Self
    where
        M: Into<String>,
        T: Into<String>,
    {
        Self {
            method: method.into(),
            target: target.into(),
            version: String::from("HTTP/1.1"),
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header<N, V>(mut self, name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.headers.set(name, value);
        self
    }

    pub fn with_body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }
}

// Public API
impl Request {
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The raw request-target (path and query), exactly as it appeared on the wire.
    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Shorthand for `headers().get(name)`.
    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The request body; empty when no `Content-Length` was declared.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

// Parse
impl Request {
    /// Reads exactly one request from `reader`.
    ///
    /// Stops after the declared body: nothing past it is consumed.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::StreamEnded`] if the stream was empty
    /// - [`ErrorKind::MalformedRequestLine`] if the first line is unterminated or
    ///   does not hold exactly three fields
    /// - [`ErrorKind::InvalidContentLength`] if `Content-Length` is not a number
    /// - [`ErrorKind::TruncatedBody`] if the stream ends inside the body
    /// - limit violations from [`ReqLimits`], encoding and I/O errors
    ///
    /// # Examples
    /// ```
    /// use framed_http::{limits::ReqLimits, Request};
    ///
    /// let mut raw = &b"POST /files/a HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello"[..];
    /// let req = Request::parse(&mut raw, &ReqLimits::default()).unwrap();
    ///
    /// assert_eq!(req.method(), "POST");
    /// assert_eq!(req.body(), b"hello");
    /// ```
    pub fn parse<R: BufRead>(reader: &mut R, limits: &ReqLimits) -> Result<Self, ErrorKind> {
        let mut line = Vec::with_capacity(128);

        match read_line(reader, limits.line_size, &mut line)? {
            LineEnd::Eof => return Err(ErrorKind::StreamEnded),
            LineEnd::Unterminated => return Err(ErrorKind::MalformedRequestLine),
            LineEnd::Terminated => {}
        }

        let mut request = Self::parse_request_line(strip_eol(&line))?;
        request.parse_headers(reader, limits, &mut line)?;
        request.read_body(reader, limits)?;

        Ok(request)
    }

    fn parse_request_line(line: &[u8]) -> Result<Self, ErrorKind> {
        let mut spaces = memchr_iter(b' ', line);

        let (Some(method_end), Some(target_end), None) =
            (spaces.next(), spaces.next(), spaces.next())
        else {
            return Err(ErrorKind::MalformedRequestLine);
        };

        let line = utf8(line)?;
        let method = &line[..method_end];
        let target = &line[method_end + 1..target_end];
        let version = &line[target_end + 1..];

        if method.is_empty() || target.is_empty() || version.is_empty() {
            return Err(ErrorKind::MalformedRequestLine);
        }

        Ok(Self {
            method: method.to_owned(),
            target: target.to_owned(),
            version: version.to_owned(),
            headers: HeaderMap::new(),
            body: Vec::new(),
        })
    }

    fn parse_headers<R: BufRead>(
        &mut self,
        reader: &mut R,
        limits: &ReqLimits,
        line: &mut Vec<u8>,
    ) -> Result<(), ErrorKind> {
        let mut count = 0;

        loop {
            line.clear();

            // A trailing line cut off by end of stream is dropped.
            if read_line(reader, limits.line_size, line)? != LineEnd::Terminated {
                return Ok(());
            }

            // A bare `\n` blank line ends the section too, same as `\r\n`.
            let content = strip_eol(line);
            if content.is_empty() {
                return Ok(());
            }

            if count == limits.header_count {
                return Err(ErrorKind::TooManyHeaders {
                    limit: limits.header_count,
                });
            }
            count += 1;

            // Lines that are not UTF-8 (obs-text values) are skipped like unsplittable ones.
            let Ok(content) = utf8(content) else {
                continue;
            };

            let content = content.trim();
            if let Some(colon) = memmem::find(content.as_bytes(), b": ") {
                self.headers.set(&content[..colon], &content[colon + 2..]);
            }
        }
    }

    fn read_body<R: BufRead>(
        &mut self,
        reader: &mut R,
        limits: &ReqLimits,
    ) -> Result<(), ErrorKind> {
        let declared = match self.headers.get("Content-Length") {
            None | Some("0") => return Ok(()),
            Some(value) => {
                types::slice_to_usize(value.as_bytes()).ok_or(ErrorKind::InvalidContentLength)?
            }
        };

        if declared > limits.body_size {
            return Err(ErrorKind::BodyTooLarge {
                declared,
                limit: limits.body_size,
            });
        }

        let mut body = Vec::with_capacity(declared);
        reader.by_ref().take(declared as u64).read_to_end(&mut body)?;

        if body.len() < declared {
            return Err(ErrorKind::TruncatedBody {
                expected: declared,
                received: body.len(),
            });
        }

        self.body = body;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEnd {
    /// Ended with `\n`.
    Terminated,
    /// Stream ended after some bytes but before `\n`.
    Unterminated,
    /// Stream ended before any byte.
    Eof,
}

/// Appends one line (terminator included) to `buf`, reading at most `limit` bytes.
fn read_line<R: BufRead>(
    reader: &mut R,
    limit: usize,
    buf: &mut Vec<u8>,
) -> Result<LineEnd, ErrorKind> {
    let read = reader.by_ref().take(limit as u64).read_until(b'\n', buf)?;

    match (read, buf.last()) {
        (0, _) => Ok(LineEnd::Eof),
        (_, Some(b'\n')) => Ok(LineEnd::Terminated),
        (read, _) if read >= limit => Err(ErrorKind::LineTooLong { limit }),
        _ => Ok(LineEnd::Unterminated),
    }
}

#[inline]
fn strip_eol(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[inline]
fn utf8(bytes: &[u8]) -> Result<&str, ErrorKind> {
    simdutf8::basic::from_utf8(bytes).map_err(|_| ErrorKind::InvalidEncoding)
}
