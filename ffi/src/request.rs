//! Request encoder: owned native copy of a flattened request.
//!
//! # Design
//! `NativeRequest` owns every string and buffer the native side reads during
//! the call. The `FfiHttpRequest` handed across is filled in by `as_mut_ptr`
//! from the fields already stored in `self`, so no pointer is taken before
//! its owner reaches its final place. Dropping the `NativeRequest` releases
//! everything at once; there is no separate free routine to forget on an
//! error path.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::ptr;

use roundtrip_core::{FlatRequest, RoundTripError};

use crate::types::{FfiHeader, FfiHttpRequest};

pub struct NativeRequest {
    url: CString,
    method: CString,
    header_strings: Vec<(CString, CString)>,
    // Same length as `header_strings`; filled in by `as_mut_ptr`.
    headers: Vec<FfiHeader>,
    body: Box<[u8]>,
    subject: Option<CString>,
    raw: FfiHttpRequest,
}

impl NativeRequest {
    /// Copy `flat` into native-compatible memory.
    ///
    /// Fails if any string contains an interior NUL. Whatever was allocated
    /// before the failure is dropped on return.
    pub fn encode(flat: FlatRequest) -> Result<Self, RoundTripError> {
        let url = c_string("url", flat.url.into_bytes())?;
        let method = c_string("method", flat.method.into_bytes())?;

        let mut header_strings = Vec::with_capacity(flat.headers.len());
        for (key, val) in flat.headers {
            header_strings.push((
                c_string("header name", key.into_bytes())?,
                c_string("header value", val)?,
            ));
        }

        let subject = flat
            .identity_subject
            .map(|s| c_string("identity subject", s.into_bytes()))
            .transpose()?;

        // Copied: the caller may still hold another handle to these bytes.
        let body: Box<[u8]> = Box::from(&flat.body[..]);

        let headers = vec![
            FfiHeader {
                key: ptr::null_mut(),
                val: ptr::null_mut(),
            };
            header_strings.len()
        ];

        Ok(Self {
            url,
            method,
            header_strings,
            headers,
            body,
            subject,
            raw: FfiHttpRequest {
                url: ptr::null_mut(),
                method: ptr::null_mut(),
                headers: ptr::null_mut(),
                headers_len: 0,
                body: ptr::null_mut(),
                body_len: 0,
            },
        })
    }

    /// Pointer handed to the native call.
    ///
    /// The pointers inside are derived here from the stored owners and stay
    /// valid until `self` is moved, mutated or dropped. Call this right
    /// before the native call.
    pub fn as_mut_ptr(&mut self) -> *mut FfiHttpRequest {
        for (slot, (key, val)) in self.headers.iter_mut().zip(&self.header_strings) {
            slot.key = key.as_ptr() as *mut c_char;
            slot.val = val.as_ptr() as *mut c_char;
        }

        self.raw = FfiHttpRequest {
            url: self.url.as_ptr() as *mut c_char,
            method: self.method.as_ptr() as *mut c_char,
            headers: if self.headers.is_empty() {
                ptr::null_mut()
            } else {
                self.headers.as_mut_ptr()
            },
            headers_len: self.headers.len(),
            body: self.body.as_ptr() as *mut c_void,
            body_len: self.body.len(),
        };
        &mut self.raw
    }

    /// Identity subject pointer, or null for "no client identity".
    pub fn subject_ptr(&self) -> *mut c_char {
        self.subject
            .as_ref()
            .map_or(ptr::null_mut(), |s| s.as_ptr() as *mut c_char)
    }

    pub fn headers_len(&self) -> usize {
        self.headers.len()
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}

fn c_string(field: &'static str, bytes: Vec<u8>) -> Result<CString, RoundTripError> {
    CString::new(bytes).map_err(|source| RoundTripError::Marshal { field, source })
}
