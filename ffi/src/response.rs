//! Response decoder: scoped ownership of the native response.
//!
//! # Design
//! `NativeResponse` wraps the pointer returned by the native call and hands
//! it back to the native release function exactly once, in `Drop`. `decode`
//! copies everything of interest into owned memory while the guard is alive,
//! so no pointer into native memory outlives the boundary call.

use std::ffi::CStr;
use std::os::raw::c_char;
use std::ptr::NonNull;
use std::slice;

use roundtrip_core::{CopiedResponse, HttpError};

use crate::types::{FfiHttpResponse, FreeResponseFn};

pub struct NativeResponse {
    ptr: NonNull<FfiHttpResponse>,
    free: FreeResponseFn,
}

impl NativeResponse {
    /// Take ownership of a response returned by the native transport.
    ///
    /// Returns `None` for a null pointer; there is nothing to release then.
    ///
    /// # Safety
    /// `ptr` must be null or a live response produced by the transport that
    /// `free` belongs to, not yet released and not owned by anything else.
    pub unsafe fn from_raw(ptr: *mut FfiHttpResponse, free: FreeResponseFn) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr, free })
    }

    /// Copy the native result into managed memory.
    ///
    /// An error record wins over everything else. A null header array or
    /// body pointer reads as empty.
    pub fn decode(&self) -> Result<CopiedResponse, HttpError> {
        // SAFETY: the pointer is live until `Drop` runs, per `from_raw`.
        let raw = unsafe { self.ptr.as_ref() };

        if let Some(error) = unsafe { raw.error.as_ref() } {
            return Err(HttpError {
                code: error.code as i64,
                description: String::from_utf8_lossy(unsafe { c_bytes(error.msg) }).into_owned(),
            });
        }

        let proto = if raw.proto.is_null() {
            None
        } else {
            Some(String::from_utf8_lossy(unsafe { c_bytes(raw.proto) }).into_owned())
        };

        let headers = if raw.headers.is_null() || raw.headers_len == 0 {
            Vec::new()
        } else {
            unsafe { slice::from_raw_parts(raw.headers, raw.headers_len) }
                .iter()
                .map(|h| unsafe { (c_bytes(h.key).to_vec(), c_bytes(h.val).to_vec()) })
                .collect()
        };

        let body = if raw.body.is_null() || raw.body_len == 0 {
            Vec::new()
        } else {
            unsafe { slice::from_raw_parts(raw.body as *const u8, raw.body_len) }.to_vec()
        };

        Ok(CopiedResponse {
            status_code: raw.status_code as i64,
            proto,
            headers,
            body,
        })
    }
}

impl Drop for NativeResponse {
    fn drop(&mut self) {
        tracing::trace!(ptr = ?self.ptr, "releasing native response");
        unsafe { (self.free)(self.ptr.as_ptr()) }
    }
}

/// Bytes of a NUL-terminated string, or nothing for null.
///
/// # Safety
/// `p` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn c_bytes<'a>(p: *const c_char) -> &'a [u8] {
    if p.is_null() {
        &[]
    } else {
        CStr::from_ptr(p).to_bytes()
    }
}
