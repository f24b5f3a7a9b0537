//! Managed HTTP request and response model.
//!
//! # Design
//! Requests are plain `http::Request<Body>` values so any client built on the
//! `http` crate can hand them over unchanged. Responses use a dedicated
//! `Response` struct because the native side may report a protocol that
//! `http::Version` cannot express (unknown, version 0.0).
//!
//! Everything in this module is owned memory. No value here ever points into
//! a buffer owned by the native transport.

use std::fmt;
use std::io::{self, Read};

use bytes::Bytes;
use http::header::{AsHeaderName, HeaderMap};
use http::request::Parts;
use http::StatusCode;

/// Request body handed to the transport.
///
/// The native call cannot stream an upload, so the body is always drained
/// into one buffer before the call. A missing body and an empty body cross
/// the boundary identically, as a zero-length buffer.
pub struct Body {
    kind: BodyKind,
}

enum BodyKind {
    Empty,
    Full(Bytes),
    Reader(Box<dyn Read + Send>),
}

impl Body {
    pub fn empty() -> Self {
        Self {
            kind: BodyKind::Empty,
        }
    }

    /// Wrap a reader that is drained when the request is encoded.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self {
            kind: BodyKind::Reader(Box::new(reader)),
        }
    }

    /// Drain the body into a single contiguous buffer.
    ///
    /// The reader is dropped before this returns, on success and on error.
    pub fn into_bytes(self) -> io::Result<Bytes> {
        match self.kind {
            BodyKind::Empty => Ok(Bytes::new()),
            BodyKind::Full(bytes) => Ok(bytes),
            BodyKind::Reader(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(Bytes::from(buf))
            }
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BodyKind::Empty => f.write_str("Body::Empty"),
            BodyKind::Full(bytes) => f.debug_tuple("Body::Full").field(&bytes.len()).finish(),
            BodyKind::Reader(_) => f.write_str("Body::Reader(..)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self {
            kind: BodyKind::Full(bytes),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Bytes::from(s).into()
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Bytes::from_static(s.as_bytes()).into()
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Self {
        Bytes::from_static(bytes).into()
    }
}

/// Request extension selecting the client identity presented during the TLS
/// handshake.
///
/// Overrides the transport's configured subject for a single request. An
/// empty subject means "present no client certificate".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySubject(pub String);

/// Protocol name and version decoded from the native protocol identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub name: &'static str,
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    pub const UNKNOWN: Self = Self {
        name: "",
        major: 0,
        minor: 0,
    };

    pub const HTTP_11: Self = Self {
        name: "HTTP/1.1",
        major: 1,
        minor: 1,
    };

    pub const HTTP_2: Self = Self {
        name: "HTTP/2.0",
        major: 2,
        minor: 0,
    };

    /// Map a native protocol identifier (ALPN style) to a protocol version.
    ///
    /// The table is closed. Anything outside it, including no identifier at
    /// all, is `UNKNOWN` and never an error.
    pub fn lookup(identifier: Option<&str>) -> Self {
        match identifier {
            Some("h2") | Some("h2c") => Self::HTTP_2,
            Some("http/1.1") => Self::HTTP_11,
            _ => Self::UNKNOWN,
        }
    }
}

/// Standard reason phrase for a status code, or `""` when there is none.
pub fn status_text(code: i64) -> &'static str {
    u16::try_from(code)
        .ok()
        .and_then(|c| StatusCode::from_u16(c).ok())
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

/// A fully buffered HTTP response rebuilt from the native result.
#[derive(Debug)]
pub struct Response {
    /// Numeric status exactly as reported by the native transport.
    pub status_code: i64,
    /// Reason phrase for `status_code`, e.g. `"OK"`.
    pub status: &'static str,
    pub proto: &'static str,
    pub proto_major: u8,
    pub proto_minor: u8,
    /// Response headers; a key repeated by the native side keeps its last value.
    pub headers: HeaderMap,
    pub body: Bytes,
    pub content_length: u64,
    /// Head of the request that produced this response. Its body was consumed
    /// by the transport.
    pub request: Parts,
}

impl Response {
    /// Typed status code, if the numeric value is a valid HTTP status.
    pub fn status(&self) -> Option<StatusCode> {
        u16::try_from(self.status_code)
            .ok()
            .and_then(|c| StatusCode::from_u16(c).ok())
    }

    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
