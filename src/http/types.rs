//! Core HTTP protocol types and utilities

/// Strict decimal parse: ASCII digits only, no sign, no whitespace, no overflow.
#[inline]
pub(crate) fn slice_to_usize(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() {
        return None;
    }

    let mut result: usize = 0;
    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return None;
        }

        result = result
            .checked_mul(10)?
            .checked_add((byte - b'0') as usize)?;
    }

    Some(result)
}

// STATUS_CODE

macro_rules! set_status_codes {
    ($(
        $(#[$docs:meta])+
        $name:ident = ($num:literal, $str:literal);
    )+) => {
        /// HTTP status codes
        ///
        /// Each variant carries its reason phrase, so a code can never be paired
        /// with the wrong text.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StatusCode { $(
            #[doc = concat!(stringify!($num), " ", $str)]
            $(#[$docs])+
            $name = $num,
        )+ }

        impl StatusCode {
            /// Numeric code, e.g. `404`.
            #[inline]
            pub const fn as_u16(&self) -> u16 {
                *self as u16
            }

            /// Reason phrase, e.g. `"Not Found"`.
            #[inline]
            pub const fn reason_phrase(&self) -> &'static str {
                match self { $(
                    StatusCode::$name => $str,
                )+ }
            }

            /// Looks up the variant for a numeric code.
            pub const fn from_u16(code: u16) -> Option<Self> {
                match code { $(
                    $num => Some(StatusCode::$name),
                )+
                    _ => None,
                }
            }
        }
    }
}

set_status_codes! {
    /// [[RFC9110, Section 15.3.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.1)]
    Ok = (200, "OK");
    /// [[RFC9110, Section 15.3.2](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.2)]
    Created = (201, "Created");

    /// [[RFC9110, Section 15.5.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.1)]
    BadRequest = (400, "Bad Request");
    /// [[RFC9110, Section 15.5.5](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.5)]
    NotFound = (404, "Not Found");
    /// [[RFC9110, Section 15.5.6](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.6)]
    MethodNotAllowed = (405, "Method Not Allowed");

    /// [[RFC9110, Section 15.6.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.1)]
    InternalServerError = (500, "Internal Server Error");
    /// [[RFC9110, Section 15.6.4](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.4)]
    ServiceUnavailable = (503, "Service Unavailable");
}

// HEADER MAP

/// Case-insensitive header table.
///
/// Names are compared with ASCII case folding on both [`set`](HeaderMap::set) and
/// [`get`](HeaderMap::get), so `Content-Length` and `content-length` are the same entry.
/// One value per name; a later `set` replaces the earlier one (name spelling included)
/// but keeps the entry's position, which makes iteration order deterministic.
///
/// # Examples
/// ```
/// use framed_http::HeaderMap;
///
/// let mut headers = HeaderMap::new();
/// headers.set("Content-Type", "text/plain");
/// headers.set("content-type", "text/html");
///
/// assert_eq!(headers.get("CONTENT-TYPE"), Some("text/html"));
/// assert_eq!(headers.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderMap {
    headers: Vec<Header>,
}

impl HeaderMap {
    #[inline]
    pub const fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Stores `value` under `name`, replacing any entry whose name differs only by case.
    pub fn set<N, V>(&mut self, name: N, value: V)
    where
        N: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        let value = value.into();

        match self
            .headers
            .iter_mut()
            .find(|h| h.name.eq_ignore_ascii_case(&name))
        {
            Some(header) => {
                header.name = name;
                header.value = value;
            }
            None => self.headers.push(Header { name, value }),
        }
    }

    /// Returns the value stored under `name`, ignoring ASCII case.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// `(name, value)` pairs in insertion order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|h| (h.name.as_str(), h.value.as_str()))
    }
}

// HEADER

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
struct Header {
    name: String,
    value: String,
}


#[cfg(test)]
mod status_code_tests {
    use super::*;

    #[test]
    fn pairs() {
        #[rustfmt::skip]
        let cases = [
            (StatusCode::Ok,                  200, "OK"),
            (StatusCode::Created,             201, "Created"),
            (StatusCode::BadRequest,          400, "Bad Request"),
            (StatusCode::NotFound,            404, "Not Found"),
            (StatusCode::MethodNotAllowed,    405, "Method Not Allowed"),
            (StatusCode::InternalServerError, 500, "Internal Server Error"),
            (StatusCode::ServiceUnavailable,  503, "Service Unavailable"),
        ];

        for (status, code, reason) in cases {
            assert_eq!(status.as_u16(), code);
            assert_eq!(status.reason_phrase(), reason);
            assert_eq!(StatusCode::from_u16(code), Some(status));
        }

        for code in [204, 302, 413, 999] {
            assert_eq!(StatusCode::from_u16(code), None);
        }
    }
}

#[cfg(test)]
mod header_map_tests {
    use super::*;

    #[test]
    fn case_insensitive() {
        let names = ["Content-Length", "content-length", "CONTENT-LENGTH", "cOnTeNt-LeNgTh"];

        for set_name in names {
            for get_name in names {
                let mut headers = HeaderMap::new();
                headers.set(set_name, "5");

                assert_eq!(headers.get(get_name), Some("5"));
                assert!(headers.contains(get_name));
            }
        }
    }

    #[test]
    fn last_write_wins() {
        let mut headers = HeaderMap::new();
        headers.set("Host", "a");
        headers.set("Accept", "*/*");
        headers.set("HOST", "b");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("host"), Some("b"));
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            [("HOST", "b"), ("Accept", "*/*")]
        );
    }

    #[test]
    fn missing() {
        let headers = HeaderMap::new();

        assert!(headers.is_empty());
        assert_eq!(headers.get("user-agent"), None);
    }
}
