//! Managed side of the Foundation round-trip transport.
//!
//! # Overview
//! Defines the request/response model, the error taxonomy and the pure
//! marshalling rules used when an HTTP request is handed to a native
//! secure-transport stack. Nothing in this crate touches foreign memory; the
//! `roundtrip-ffi` crate copies the flat values produced here into C layouts
//! and back.
//!
//! # Design
//! - Requests are `http::Request<Body>`; the optional client identity rides
//!   along as an `IdentitySubject` extension.
//! - `marshal::build_request` and `marshal::parse_response` hold every
//!   policy decision so they can be tested without a native transport.
//! - `RoundTrip` is the seam a higher-level client programs against.

pub mod config;
pub mod error;
pub mod http;
pub mod marshal;
pub mod transport;

pub use config::TransportConfig;
pub use error::{HttpError, RoundTripError};
pub use crate::http::{status_text, Body, IdentitySubject, ProtocolVersion, Response};
pub use marshal::{build_request, parse_response, CopiedResponse, FlatRequest};
pub use transport::RoundTrip;
