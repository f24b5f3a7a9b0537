//! Transport invoker and the `RoundTrip` implementation.
//!
//! # Design
//! The native transport is reached through exactly two function pointers.
//! Production code binds them to the platform library (feature
//! `foundation`); tests bind them to stubs written as Rust `extern "C"`
//! functions. `FoundationTransport` holds no mutable state, so one value can
//! serve any number of concurrent callers.

use http::Request;
use roundtrip_core::{
    build_request, parse_response, Body, HttpError, Response, RoundTrip, RoundTripError,
    TransportConfig,
};

use crate::request::NativeRequest;
use crate::response::NativeResponse;
use crate::types::{FreeResponseFn, RoundTripFn};

/// Code reported when the native call returns no response at all.
pub const NO_RESPONSE_CODE: i64 = -1;

/// Entry points of a native transport.
#[derive(Debug, Clone, Copy)]
pub struct NativeTransport {
    round_trip: RoundTripFn,
    free_response: FreeResponseFn,
}

impl NativeTransport {
    /// # Safety
    /// `round_trip` must only read the request it is given, must not retain
    /// any pointer into it after returning, and must return null or a
    /// response that `free_response` releases. Both functions must be safe to
    /// call concurrently from independent threads.
    pub unsafe fn new(round_trip: RoundTripFn, free_response: FreeResponseFn) -> Self {
        Self {
            round_trip,
            free_response,
        }
    }

    /// The platform implementation linked into this binary.
    #[cfg(feature = "foundation")]
    pub fn foundation() -> Self {
        Self {
            round_trip: sys::RoundTrip,
            free_response: sys::FreeHTTPResponse,
        }
    }

    /// Perform the single blocking native call.
    ///
    /// The returned guard releases the response when dropped. `None` means
    /// the transport returned a null pointer.
    pub fn invoke(&self, request: &mut NativeRequest) -> Option<NativeResponse> {
        let subject = request.subject_ptr();
        let raw = unsafe { (self.round_trip)(request.as_mut_ptr(), subject) };
        // SAFETY: `raw` comes straight from this transport and is owned by no one else.
        unsafe { NativeResponse::from_raw(raw, self.free_response) }
    }
}

/// HTTP transport backed by the platform secure-transport stack.
///
/// TLS, trust evaluation and client identity selection all happen on the
/// native side; this type only marshals data across the boundary.
#[derive(Debug, Clone)]
pub struct FoundationTransport {
    native: NativeTransport,
    config: TransportConfig,
}

impl FoundationTransport {
    #[cfg(feature = "foundation")]
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    #[cfg(feature = "foundation")]
    pub fn with_config(config: TransportConfig) -> Self {
        Self::with_native(NativeTransport::foundation(), config)
    }

    pub fn with_native(native: NativeTransport, config: TransportConfig) -> Self {
        Self { native, config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[cfg(feature = "foundation")]
impl Default for FoundationTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundTrip for FoundationTransport {
    fn round_trip(&self, request: Request<Body>) -> Result<Response, RoundTripError> {
        let (flat, parts) = build_request(request, self.config.identity_subject())?;
        let mut native_request = NativeRequest::encode(flat)?;

        tracing::debug!(
            method = %parts.method,
            uri = %parts.uri,
            headers = native_request.headers_len(),
            body_len = native_request.body_len(),
            identity = !native_request.subject_ptr().is_null(),
            "invoking native transport"
        );

        let copied = match self.native.invoke(&mut native_request) {
            // The guard releases the native response at the end of this arm.
            Some(native_response) => native_response.decode(),
            None => Err(HttpError {
                code: NO_RESPONSE_CODE,
                description: "native transport returned no response".to_string(),
            }),
        };
        drop(native_request);

        let copied = copied.inspect_err(|e| {
            tracing::debug!(code = e.code, error = %e.description, "native transport failed")
        })?;
        let response = parse_response(copied, parts);
        tracing::debug!(
            status = response.status_code,
            proto = response.proto,
            content_length = response.content_length,
            "native transport responded"
        );
        Ok(response)
    }
}

#[cfg(feature = "foundation")]
#[allow(non_snake_case)]
mod sys {
    use std::os::raw::c_char;

    use crate::types::{FfiHttpRequest, FfiHttpResponse};

    #[link(name = "Foundation", kind = "framework")]
    #[link(name = "Security", kind = "framework")]
    unsafe extern "C" {
        pub fn RoundTrip(req: *mut FfiHttpRequest, subject_name: *mut c_char) -> *mut FfiHttpResponse;
        pub fn FreeHTTPResponse(resp: *mut FfiHttpResponse);
    }
}
