//! `#[repr(C)]` layouts shared with the native transport.
//!
//! # Design
//! These mirror the C structs the platform implementation is compiled
//! against (`http_header`, `http_request`, `http_error`, `http_response`).
//! `NSInteger` / `NSUInteger` are pointer sized, hence `isize` / `usize`.
//! The build script feeds this file to cbindgen so the C side can include a
//! generated header instead of keeping a hand-written copy in sync.
//!
//! Nothing here owns memory. Ownership lives in `request::NativeRequest`
//! (request side) and `response::NativeResponse` (response side).

use std::ffi::c_void;
use std::os::raw::c_char;

/// A single header as a pair of NUL-terminated strings.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub val: *mut c_char,
}

/// Request handed to the native `RoundTrip` call.
///
/// `headers` is null when `headers_len` is 0. `body` always points at
/// `body_len` readable bytes, which may be zero.
#[repr(C)]
#[derive(Debug)]
pub struct FfiHttpRequest {
    pub url: *mut c_char,
    pub method: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: usize,
    pub body: *mut c_void,
    pub body_len: usize,
}

/// Error reported by the native side in place of a response.
#[repr(C)]
#[derive(Debug)]
pub struct FfiHttpError {
    pub code: isize,
    pub msg: *mut c_char,
}

/// Response returned by the native `RoundTrip` call.
///
/// When `error` is non-null the remaining fields carry no meaning. The
/// whole structure stays owned by the native side until it is passed back
/// to `FreeHTTPResponse`.
///
/// cbindgen:field-names=[statusCode, proto, headers, headers_len, body, body_len, error]
#[repr(C)]
#[derive(Debug)]
pub struct FfiHttpResponse {
    pub status_code: isize,
    pub proto: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: usize,
    pub body: *mut c_void,
    pub body_len: usize,
    pub error: *mut FfiHttpError,
}

/// `http_response *RoundTrip(http_request *req, char *subjectName)`
pub type RoundTripFn =
    unsafe extern "C" fn(req: *mut FfiHttpRequest, subject_name: *mut c_char) -> *mut FfiHttpResponse;

/// `void FreeHTTPResponse(http_response *r)`
pub type FreeResponseFn = unsafe extern "C" fn(resp: *mut FfiHttpResponse);
