//! HTTP response model and its wire serializer.

use crate::http::types::{HeaderMap, StatusCode};
use std::io::{self, Write};

/// HTTP response produced by a [`Handler`](crate::Handler).
///
/// Starts as `HTTP/1.1 200 OK` with no headers and no body. The status code and
/// reason phrase always move together through [`StatusCode`].
///
/// Serialization writes exactly what was set: no `Content-Length`, `Connection` or
/// `Date` header is added. A handler that sets a body is expected to declare its
/// length, most easily through [`with_sized_body`](Response::with_sized_body).
///
/// # Examples
/// ```
/// use framed_http::{Response, StatusCode};
///
/// let resp = Response::new()
///     .with_header("Content-Type", "text/plain")
///     .with_sized_body("hello");
///
/// assert_eq!(
///     resp.to_bytes(),
///     b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello"
/// );
///
/// let missing = Response::from_status(StatusCode::NotFound);
/// assert_eq!(missing.to_bytes(), b"HTTP/1.1 404 Not Found\r\n\r\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    version: String,
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    #[inline]
    pub fn new() -> Self {
        Self::from_status(StatusCode::Ok)
    }

    #[inline]
    pub fn from_status(status: StatusCode) -> Self {
        Self {
            version: String::from("HTTP/1.1"),
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }
}

// Builder
impl Response {
    #[inline]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[inline]
    pub fn with_header<N, V>(mut self, name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.headers.set(name, value);
        self
    }

    #[inline]
    pub fn with_body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the body and a matching `Content-Length` (in bytes).
    #[inline]
    pub fn with_sized_body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.set_sized_body(body);
        self
    }
}

// In-place mutation
impl Response {
    #[inline]
    pub fn set_version<V: Into<String>>(&mut self, version: V) -> &mut Self {
        self.version = version.into();
        self
    }

    #[inline]
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    #[inline]
    pub fn set_header<N, V>(&mut self, name: N, value: V) -> &mut Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.headers.set(name, value);
        self
    }

    #[inline]
    pub fn set_body<B: Into<Vec<u8>>>(&mut self, body: B) -> &mut Self {
        self.body = body.into();
        self
    }

    pub fn set_sized_body<B: Into<Vec<u8>>>(&mut self, body: B) -> &mut Self {
        self.body = body.into();
        self.headers
            .set("Content-Length", self.body.len().to_string());
        self
    }
}

// Accessors
impl Response {
    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[inline]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

// Serialize
impl Response {
    /// Appends the wire form of the response to `buffer`.
    ///
    /// ```text
    /// [VERSION] SP [CODE] SP [REASON] CRLF
    /// ([NAME]: SP [VALUE] CRLF)*
    /// CRLF
    /// [BODY]
    /// ```
    pub fn write_to(&self, buffer: &mut Vec<u8>) {
        buffer.reserve(self.estimated_len());

        buffer.extend_from_slice(self.version.as_bytes());
        buffer.push(b' ');
        buffer.extend_from_slice(&code_digits(self.status.as_u16()));
        buffer.push(b' ');
        buffer.extend_from_slice(self.status.reason_phrase().as_bytes());
        buffer.extend_from_slice(b"\r\n");

        for (name, value) in self.headers.iter() {
            buffer.extend_from_slice(name.as_bytes());
            buffer.extend_from_slice(b": ");
            buffer.extend_from_slice(value.as_bytes());
            buffer.extend_from_slice(b"\r\n");
        }

        buffer.extend_from_slice(b"\r\n");
        buffer.extend_from_slice(&self.body);
    }

    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer);
        buffer
    }

    /// Serializes into `writer` with a single `write_all`, then flushes.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()
    }

    fn estimated_len(&self) -> usize {
        // SP code SP reason CRLF, then the blank CRLF
        let head = self.version.len() + 5 + self.status.reason_phrase().len() + 4;
        let headers: usize = self
            .headers
            .iter()
            .map(|(name, value)| name.len() + value.len() + 4)
            .sum();

        head + headers + self.body.len()
    }
}

#[inline]
const fn code_digits(code: u16) -> [u8; 3] {
    [
        b'0' + (code / 100 % 10) as u8,
        b'0' + (code / 10 % 10) as u8,
        b'0' + (code % 10) as u8,
    ]
}


#[cfg(test)]
mod serialize_tests {
    use super::*;
    use crate::tools::*;

    #[test]
    fn headers_and_body() {
        let resp = Response::new()
            .with_header("Content-Type", "text/plain")
            .with_header("Content-Length", "5")
            .with_body("hello");

        assert_eq!(
            str_op(&resp.to_bytes()),
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello"
        );
    }

    #[test]
    fn no_length_injection() {
        let resp = Response::new().with_body("abc");

        assert_eq!(str_op(&resp.to_bytes()), "HTTP/1.1 200 OK\r\n\r\nabc");
    }

    #[test]
    fn sized_body() {
        #[rustfmt::skip]
        let cases: [(&[u8], &str); 4] = [
            (b"",               "0"),
            (b"abc",            "3"),
            ("héllo".as_bytes(), "6"),
            (&[0u8; 300],       "300"),
        ];

        for (body, length) in cases {
            let resp = Response::new().with_sized_body(body);

            assert_eq!(resp.headers().get("content-length"), Some(length));
            assert_eq!(resp.body(), body);
        }
    }

    #[test]
    fn header_overwrite_keeps_position() {
        let mut resp = Response::new();
        resp.set_header("Content-Length", "1")
            .set_header("Content-Type", "text/plain")
            .set_header("content-length", "2")
            .set_body("ab");

        assert_eq!(
            str_op(&resp.to_bytes()),
            "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nContent-Type: text/plain\r\n\r\nab"
        );
    }

    #[test]
    fn binary_body_verbatim() {
        let body = vec![0x00, 0xff, b'\r', b'\n', 0x80];
        let resp = Response::new().with_body(body.clone());

        let bytes = resp.to_bytes();
        assert!(bytes.ends_with(b"\r\n\r\n\x00\xff\r\n\x80"));
        assert_eq!(bytes.len(), "HTTP/1.1 200 OK\r\n\r\n".len() + body.len());
    }

    #[test]
    fn write_to_writer() {
        let resp = Response::from_status(StatusCode::Created);
        let mut out = Vec::new();

        resp.write(&mut out).unwrap();
        assert_eq!(str_op(&out), "HTTP/1.1 201 Created\r\n\r\n");
    }

    #[test]
    fn code_digits_all() {
        assert_eq!(&code_digits(200), b"200");
        assert_eq!(&code_digits(404), b"404");
        assert_eq!(&code_digits(503), b"503");
    }
}
