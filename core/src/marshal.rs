//! Managed-side halves of request encoding and response decoding.
//!
//! # Design
//! The native boundary is split in two. This module does everything that
//! needs no foreign memory: `build_request` flattens an `http::Request` into
//! owned strings and bytes, and `parse_response` turns data already copied
//! out of the native response into a `Response`. The FFI crate only moves
//! these flat values into and out of C layouts, which keeps every policy
//! decision (header joining, protocol table, last-value-wins) testable
//! without a native transport.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::request::Parts;
use http::Request;

use crate::error::RoundTripError;
use crate::http::{status_text, Body, IdentitySubject, ProtocolVersion, Response};

/// A request flattened into owned parts, ready to be copied into native
/// memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRequest {
    pub url: String,
    pub method: String,
    /// One entry per distinct header name, values comma-joined in order.
    pub headers: Vec<(String, Vec<u8>)>,
    pub body: Bytes,
    /// Non-empty identity subject to hand to the transport, if any.
    pub identity_subject: Option<String>,
}

/// Response data copied out of native memory, before any interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopiedResponse {
    pub status_code: i64,
    pub proto: Option<String>,
    /// Pairs in native order; duplicates are resolved by `parse_response`.
    pub headers: Vec<(Vec<u8>, Vec<u8>)>,
    pub body: Vec<u8>,
}

/// Flatten `request` for the native call.
///
/// The identity subject comes from the request's `IdentitySubject` extension
/// when present, otherwise from `default_subject`. An empty subject in either
/// place means no identity. The body is drained here; a read failure aborts
/// the round trip before anything is handed to the transport.
pub fn build_request(
    request: Request<Body>,
    default_subject: Option<&str>,
) -> Result<(FlatRequest, Parts), RoundTripError> {
    let (parts, body) = request.into_parts();

    let identity_subject = match parts.extensions.get::<IdentitySubject>() {
        Some(IdentitySubject(subject)) => Some(subject.as_str()),
        None => default_subject,
    }
    .filter(|s| !s.is_empty())
    .map(str::to_owned);

    let body = body.into_bytes().map_err(RoundTripError::ReadBody)?;

    let flat = FlatRequest {
        url: parts.uri.to_string(),
        method: parts.method.as_str().to_owned(),
        headers: join_headers(&parts.headers),
        body,
        identity_subject,
    };
    Ok((flat, parts))
}

/// Collapse every header name to a single comma-joined value.
///
/// Names come out in the map's key order; values keep insertion order.
pub fn join_headers(headers: &HeaderMap) -> Vec<(String, Vec<u8>)> {
    headers
        .keys()
        .map(|name| {
            let mut joined = Vec::new();
            for (i, value) in headers.get_all(name).iter().enumerate() {
                if i > 0 {
                    joined.push(b',');
                }
                joined.extend_from_slice(value.as_bytes());
            }
            (name.as_str().to_owned(), joined)
        })
        .collect()
}

/// Build the managed response from copied native data.
///
/// Header pairs are applied in order with last-value-wins semantics. Pairs
/// that are not valid HTTP header names or values are skipped.
pub fn parse_response(copied: CopiedResponse, request: Parts) -> Response {
    let protocol = ProtocolVersion::lookup(copied.proto.as_deref());

    let mut headers = HeaderMap::with_capacity(copied.headers.len());
    for (key, value) in &copied.headers {
        match (HeaderName::from_bytes(key), HeaderValue::from_bytes(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::debug!(
                key = %String::from_utf8_lossy(key),
                "skipping response header the header map cannot represent"
            ),
        }
    }

    let body = Bytes::from(copied.body);
    Response {
        status_code: copied.status_code,
        status: status_text(copied.status_code),
        proto: protocol.name,
        proto_major: protocol.major,
        proto_minor: protocol.minor,
        headers,
        content_length: body.len() as u64,
        body,
        request,
    }
}
