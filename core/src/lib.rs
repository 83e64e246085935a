//! Immutable REST client core.
//!
//! # Overview
//! `RequestClient` issues GET/POST/PUT/DELETE requests against a base URL,
//! encoding request payloads and decoding responses according to their
//! content type. The network exchange itself is delegated to a `Transport`;
//! with the default `ureq` feature a blocking ureq-backed transport is used by
//! `get`/`post`/`put`/`delete`.
//!
//! # Design
//! - `RequestClient` is immutable. Setters return new clients, so a single
//!   instance can be shared freely across threads.
//! - Each call is split into `build_request` and `parse_response` around the
//!   transport, keeping the I/O boundary explicit and testable.
//! - Bodies are dispatched through a MIME-keyed codec table; decoded bodies
//!   are a `ResponseBody` union over JSON, form fields and raw bytes.

pub mod client;
pub mod codec;
pub mod error;
pub mod headers;
pub mod http;
pub mod json;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;

pub use client::RequestClient;
pub use error::ApiError;
pub use headers::{HeaderOptions, Headers};
pub use http::{
    HttpMethod, HttpRequest, HttpResponse, RequestBody, ResponseHeaders, Transport, TransportError,
};
pub use json::JsonOptions;
#[cfg(feature = "ureq")]
pub use transport::{TransportConfig, UreqTransport};
pub use types::ResponseBody;
