//! Error types for the REST client.
//!
//! # Design
//! Configuration mistakes (`InvalidConfiguration`, `InvalidPayload`,
//! `UnsupportedContentType`) and codec failures are programmer errors and
//! surface at the call that triggered them. `TransportError` and
//! `HttpStatusError` are the ordinary runtime failure modes of talking to a
//! remote API; `is_runtime` separates the two groups for callers.

use std::fmt;

use crate::http::TransportError;
use crate::types::ResponseBody;

/// Errors returned by `RequestClient` operations.
#[derive(Debug)]
pub enum ApiError {
    /// `set_content_type` was given a MIME type outside the allow-list.
    InvalidConfiguration(String),

    /// POST/PUT payload was missing or not the shape the content type needs.
    InvalidPayload(String),

    /// Encode or decode dispatch found no codec for this MIME type.
    UnsupportedContentType(String),

    /// The request payload could not be serialized.
    EncodingError(String),

    /// The response body could not be parsed.
    DecodingError(String),

    /// The transport failed before any response was received.
    TransportError { code: String, message: String },

    /// The server answered with a status outside 200–299.
    HttpStatusError { status: u16, body: ResponseBody },
}

impl ApiError {
    /// True for failures a caller is expected to handle at runtime (network
    /// trouble and non-2xx answers), false for misuse of the client.
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            ApiError::TransportError { .. } | ApiError::HttpStatusError { .. }
        )
    }

    /// Status code of an `HttpStatusError`.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatusError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::TransportError {
            code: err.code,
            message: err.message,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidConfiguration(msg) => {
                write!(f, "invalid configuration: {msg}")
            }
            ApiError::InvalidPayload(msg) => write!(f, "invalid payload: {msg}"),
            ApiError::UnsupportedContentType(mime) => {
                write!(f, "unsupported content type: {mime:?}")
            }
            ApiError::EncodingError(msg) => write!(f, "encoding failed: {msg}"),
            ApiError::DecodingError(msg) => write!(f, "decoding failed: {msg}"),
            ApiError::TransportError { code, message } => {
                write!(f, "transport error ({code}): {message}")
            }
            ApiError::HttpStatusError { status, body } => {
                write!(f, "HTTP {status}: {body}")
            }
        }
    }
}

impl std::error::Error for ApiError {}
