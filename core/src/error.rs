//! Error types for the round-trip transport.
//!
//! # Design
//! `HttpError` is what the native transport reports in place of a response
//! (DNS failure, refused connection, rejected client identity, ...). It is
//! surfaced verbatim. `RoundTripError` adds the two local failures that happen
//! before the native call and therefore never reach the transport.

use std::ffi::NulError;
use std::io;

/// Failure reported by the native transport instead of a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("HTTP Error ({code}): {description}")]
pub struct HttpError {
    pub code: i64,
    pub description: String,
}

/// Errors returned by `RoundTrip::round_trip`.
#[derive(Debug, thiserror::Error)]
pub enum RoundTripError {
    /// Draining the request body failed. The transport was not invoked.
    #[error("could not read request body: {0}")]
    ReadBody(#[source] io::Error),

    /// A request string contains an interior NUL and cannot be passed as a C
    /// string. The transport was not invoked.
    #[error("could not marshal request {field}: {source}")]
    Marshal {
        field: &'static str,
        #[source]
        source: NulError,
    },

    /// The native transport reported an error.
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl RoundTripError {
    /// The native error, if this failure came from the transport.
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            RoundTripError::Http(e) => Some(e),
            _ => None,
        }
    }
}
