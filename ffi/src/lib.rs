//! Native boundary of the Foundation round-trip transport.
//!
//! # Overview
//! Marshals a request built by `roundtrip-core` into the C layout the
//! platform secure-transport stack expects, performs the single blocking
//! `RoundTrip` call, and copies the native response back into managed
//! memory before releasing it.
//!
//! # Design
//! - Each side of the boundary has one owner: `NativeRequest` for memory we
//!   allocate, `NativeResponse` for memory the native side allocates. Both
//!   release in `Drop`, so early returns cannot leak or double free.
//! - The native transport is two function pointers (`NativeTransport`), which
//!   lets tests substitute stubs for the platform library.
//! - `FoundationTransport` implements `roundtrip_core::RoundTrip`.

pub mod request;
pub mod response;
pub mod transport;
pub mod types;

pub use request::NativeRequest;
pub use response::NativeResponse;
pub use transport::{FoundationTransport, NativeTransport, NO_RESPONSE_CODE};
pub use types::{FfiHeader, FfiHttpError, FfiHttpRequest, FfiHttpResponse, FreeResponseFn, RoundTripFn};
