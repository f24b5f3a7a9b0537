//! The round-trip contract shared by every transport.

use std::sync::Arc;

use http::Request;

use crate::error::RoundTripError;
use crate::http::{Body, Response};

/// Execute a single HTTP transaction.
///
/// Implementations perform exactly one request and return exactly one
/// response or error. They do not follow redirects, retry, or pool
/// connections; callers that need those layer them on top.
pub trait RoundTrip {
    fn round_trip(&self, request: Request<Body>) -> Result<Response, RoundTripError>;
}

impl<T: RoundTrip + ?Sized> RoundTrip for &T {
    fn round_trip(&self, request: Request<Body>) -> Result<Response, RoundTripError> {
        (**self).round_trip(request)
    }
}

impl<T: RoundTrip + ?Sized> RoundTrip for Box<T> {
    fn round_trip(&self, request: Request<Body>) -> Result<Response, RoundTripError> {
        (**self).round_trip(request)
    }
}

impl<T: RoundTrip + ?Sized> RoundTrip for Arc<T> {
    fn round_trip(&self, request: Request<Body>) -> Result<Response, RoundTripError> {
        (**self).round_trip(request)
    }
}
