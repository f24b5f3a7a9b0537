//! Stub native transports written as Rust `extern "C"` functions.
//!
//! # Design
//! Every response a stub hands out is recorded in a per-thread ledger and
//! crossed off again by `stub_free`, so a test can assert that each native
//! allocation was released exactly once. A counting global allocator tracks
//! live heap blocks per thread for the managed side; stub bookkeeping runs
//! with counting paused so it never shows up in those numbers.

#![allow(dead_code)]

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::{ptr, slice};

use roundtrip_core::TransportConfig;
use roundtrip_ffi::{
    FfiHeader, FfiHttpError, FfiHttpRequest, FfiHttpResponse, FoundationTransport, NativeTransport,
    RoundTripFn,
};

// ---------------------------------------------------------------------------
// Counting allocator
// ---------------------------------------------------------------------------

pub struct CountingAlloc;

#[global_allocator]
static ALLOC: CountingAlloc = CountingAlloc;

thread_local! {
    static LIVE_BLOCKS: Cell<isize> = const { Cell::new(0) };
    static PAUSED: Cell<bool> = const { Cell::new(false) };
}

fn adjust(delta: isize) {
    if PAUSED.try_with(|p| p.get()).unwrap_or(true) {
        return;
    }
    let _ = LIVE_BLOCKS.try_with(|n| n.set(n.get() + delta));
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let p = System.alloc(layout);
        if !p.is_null() {
            adjust(1);
        }
        p
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        adjust(-1);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        System.realloc(ptr, layout, new_size)
    }
}

/// Heap blocks allocated and not yet freed by this thread.
pub fn live_blocks() -> isize {
    LIVE_BLOCKS.with(|n| n.get())
}

/// Run `f` without counting its allocations.
fn untracked<T>(f: impl FnOnce() -> T) -> T {
    let was = PAUSED.with(|p| p.replace(true));
    let out = f();
    PAUSED.with(|p| p.set(was));
    out
}

// ---------------------------------------------------------------------------
// Native-side ledger
// ---------------------------------------------------------------------------

/// The request as the stub saw it, copied out during the call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenRequest {
    pub url: String,
    pub method: String,
    /// `None` when the header array pointer was null.
    pub headers: Option<Vec<(String, String)>>,
    pub headers_len: usize,
    pub body: Vec<u8>,
    pub body_is_null: bool,
    pub subject: Option<String>,
}

/// What `scripted_round_trip` returns on its next call.
#[derive(Debug, Clone)]
pub enum Scripted {
    Response {
        status: isize,
        proto: Option<&'static str>,
        headers: Vec<(&'static str, &'static str)>,
        body: Vec<u8>,
    },
    /// A header array length with a null array pointer.
    NullHeaders { status: isize, headers_len: usize },
    Error { code: isize, msg: Option<&'static str> },
    Null,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub allocated: usize,
    pub released: usize,
    pub unknown_released: usize,
    pub live: usize,
}

#[derive(Default)]
struct Ledger {
    live: HashSet<usize>,
    allocated: usize,
    released: usize,
    unknown_released: usize,
    seen: Vec<SeenRequest>,
    script: Option<Scripted>,
}

thread_local! {
    static LEDGER: RefCell<Ledger> = RefCell::new(Ledger::default());
}

pub fn counts() -> Counts {
    untracked(|| {
        LEDGER.with(|l| {
            let l = l.borrow();
            Counts {
                allocated: l.allocated,
                released: l.released,
                unknown_released: l.unknown_released,
                live: l.live.len(),
            }
        })
    })
}

/// Requests seen by stubs on this thread, oldest first. Clears the list.
pub fn take_seen() -> Vec<SeenRequest> {
    untracked(|| LEDGER.with(|l| std::mem::take(&mut l.borrow_mut().seen)))
}

/// Drop the recorded requests without counting the release.
pub fn clear_seen() {
    untracked(|| LEDGER.with(|l| l.borrow_mut().seen.clear()));
}

/// Set the outcome of the next `scripted_round_trip` call on this thread.
pub fn script(next: Scripted) {
    untracked(|| LEDGER.with(|l| l.borrow_mut().script = Some(next)));
}

fn record(seen: SeenRequest) {
    LEDGER.with(|l| l.borrow_mut().seen.push(seen));
}

fn track(resp: *mut FfiHttpResponse) -> *mut FfiHttpResponse {
    if !resp.is_null() {
        LEDGER.with(|l| {
            let mut l = l.borrow_mut();
            l.allocated += 1;
            l.live.insert(resp as usize);
        });
    }
    resp
}

// ---------------------------------------------------------------------------
// Native memory helpers
// ---------------------------------------------------------------------------

unsafe fn cstr(p: *const c_char) -> String {
    if p.is_null() {
        String::new()
    } else {
        CStr::from_ptr(p).to_string_lossy().into_owned()
    }
}

/// Copy out everything the native side is allowed to read.
pub unsafe fn read_request(req: *const FfiHttpRequest, subject: *const c_char) -> SeenRequest {
    let r = &*req;
    let headers = if r.headers.is_null() {
        None
    } else {
        Some(
            slice::from_raw_parts(r.headers, r.headers_len)
                .iter()
                .map(|h| (cstr(h.key), cstr(h.val)))
                .collect(),
        )
    };
    let body = if r.body.is_null() {
        Vec::new()
    } else {
        slice::from_raw_parts(r.body as *const u8, r.body_len).to_vec()
    };
    SeenRequest {
        url: cstr(r.url),
        method: cstr(r.method),
        headers,
        headers_len: r.headers_len,
        body,
        body_is_null: r.body.is_null(),
        subject: (!subject.is_null()).then(|| cstr(subject)),
    }
}

fn c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', "")).unwrap_or_default().into_raw()
}

fn alloc_headers(headers: &[(String, String)]) -> (*mut FfiHeader, usize) {
    if headers.is_empty() {
        return (ptr::null_mut(), 0);
    }
    let pairs: Box<[FfiHeader]> = headers
        .iter()
        .map(|(k, v)| FfiHeader {
            key: c_string(k),
            val: c_string(v),
        })
        .collect();
    let len = pairs.len();
    (Box::into_raw(pairs) as *mut FfiHeader, len)
}

/// Allocate a success response the way a native implementation would.
pub fn alloc_response(
    status: isize,
    proto: Option<&str>,
    headers: &[(String, String)],
    body: &[u8],
) -> *mut FfiHttpResponse {
    let (headers, headers_len) = alloc_headers(headers);
    let body: Box<[u8]> = Box::from(body);
    let body_len = body.len();
    Box::into_raw(Box::new(FfiHttpResponse {
        status_code: status,
        proto: proto.map_or(ptr::null_mut(), c_string),
        headers,
        headers_len,
        body: Box::into_raw(body) as *mut c_void,
        body_len,
        error: ptr::null_mut(),
    }))
}

/// Allocate an error response.
pub fn alloc_error(code: isize, msg: Option<&str>) -> *mut FfiHttpResponse {
    let error = Box::into_raw(Box::new(FfiHttpError {
        code,
        msg: msg.map_or(ptr::null_mut(), c_string),
    }));
    Box::into_raw(Box::new(FfiHttpResponse {
        status_code: 0,
        proto: ptr::null_mut(),
        headers: ptr::null_mut(),
        headers_len: 0,
        body: ptr::null_mut(),
        body_len: 0,
        error,
    }))
}

unsafe fn release(resp: *mut FfiHttpResponse) {
    let resp = Box::from_raw(resp);
    if !resp.proto.is_null() {
        drop(CString::from_raw(resp.proto));
    }
    if !resp.headers.is_null() {
        let pairs = Box::from_raw(ptr::slice_from_raw_parts_mut(resp.headers, resp.headers_len));
        for h in pairs.iter() {
            drop(CString::from_raw(h.key));
            drop(CString::from_raw(h.val));
        }
    }
    if !resp.body.is_null() {
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
            resp.body as *mut u8,
            resp.body_len,
        )));
    }
    if !resp.error.is_null() {
        let error = Box::from_raw(resp.error);
        if !error.msg.is_null() {
            drop(CString::from_raw(error.msg));
        }
    }
}

// ---------------------------------------------------------------------------
// Stub entry points
// ---------------------------------------------------------------------------

/// Release a response produced by any stub in this module.
///
/// Pointers the ledger does not know (already released, or never handed
/// out) are counted and left alone instead of being freed twice.
pub unsafe extern "C" fn stub_free(resp: *mut FfiHttpResponse) {
    if resp.is_null() {
        return;
    }
    untracked(|| {
        let known = LEDGER.with(|l| {
            let mut l = l.borrow_mut();
            if l.live.remove(&(resp as usize)) {
                l.released += 1;
                true
            } else {
                l.unknown_released += 1;
                false
            }
        });
        if known {
            let _ = catch_unwind(AssertUnwindSafe(|| unsafe { release(resp) }));
        }
    });
}

/// Body shared by every stub: copy the request out, let `respond` build the
/// native response, and ledger both. A panic in `respond` becomes a null
/// response instead of unwinding into the caller.
///
/// # Safety
/// `req` must point to a live request and `subject` must be null or a
/// NUL-terminated string, as the native contract guarantees.
pub unsafe fn answer(
    req: *const FfiHttpRequest,
    subject: *const c_char,
    respond: impl FnOnce(&SeenRequest) -> *mut FfiHttpResponse,
) -> *mut FfiHttpResponse {
    untracked(|| {
        catch_unwind(AssertUnwindSafe(|| {
            let seen = unsafe { read_request(req, subject) };
            let resp = respond(&seen);
            record(seen);
            track(resp)
        }))
        .unwrap_or(ptr::null_mut())
    })
}

/// Answers 200 over "http/1.1", echoing the request headers and body and
/// describing the request in `x-echo-*` headers.
pub unsafe extern "C" fn echo_round_trip(
    req: *mut FfiHttpRequest,
    subject: *mut c_char,
) -> *mut FfiHttpResponse {
    answer(req, subject, |seen| {
        let mut headers = seen.headers.clone().unwrap_or_default();
        headers.push(("x-echo-method".to_string(), seen.method.clone()));
        headers.push(("x-echo-url".to_string(), seen.url.clone()));
        if let Some(subject) = &seen.subject {
            headers.push(("x-echo-subject".to_string(), subject.clone()));
        }
        alloc_response(200, Some("http/1.1"), &headers, &seen.body)
    })
}

/// Answers with whatever `script` set last; a null response if nothing was
/// scripted.
pub unsafe extern "C" fn scripted_round_trip(
    req: *mut FfiHttpRequest,
    subject: *mut c_char,
) -> *mut FfiHttpResponse {
    answer(req, subject, |_| {
        let next = LEDGER.with(|l| l.borrow_mut().script.take());
        match next {
            Some(Scripted::Response {
                status,
                proto,
                headers,
                body,
            }) => {
                let headers: Vec<(String, String)> = headers
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                alloc_response(status, proto, &headers, &body)
            }
            Some(Scripted::NullHeaders {
                status,
                headers_len,
            }) => {
                let resp = alloc_response(status, None, &[], &[]);
                unsafe { (*resp).headers_len = headers_len };
                resp
            }
            Some(Scripted::Error { code, msg }) => alloc_error(code, msg),
            Some(Scripted::Null) | None => ptr::null_mut(),
        }
    })
}

pub fn transport_with(round_trip: RoundTripFn, config: TransportConfig) -> FoundationTransport {
    // SAFETY: the stubs only read the request during the call and every
    // response they return is released by `stub_free`.
    let native = unsafe { NativeTransport::new(round_trip, stub_free) };
    FoundationTransport::with_native(native, config)
}

pub fn echo_transport() -> FoundationTransport {
    transport_with(echo_round_trip, TransportConfig::default())
}

pub fn scripted_transport() -> FoundationTransport {
    transport_with(scripted_round_trip, TransportConfig::default())
}
