//! Content-type dispatch for request and response bodies.
//!
//! # Design
//! Every supported MIME type is one row in `CODECS` with an optional encoder
//! and an optional decoder. A missing row, or a row without the needed half,
//! is reported as `UnsupportedContentType`. Adding a format means adding a
//! row, not another branch.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::trace;

use crate::error::ApiError;
use crate::http::RequestBody;
use crate::json::{self, JsonOptions};
use crate::types::ResponseBody;

type EncodeFn = fn(&Value, &JsonOptions) -> Result<RequestBody, ApiError>;
type DecodeFn = fn(&[u8], &JsonOptions) -> Result<ResponseBody, ApiError>;

struct Codec {
    mime: &'static str,
    encode: Option<EncodeFn>,
    decode: Option<DecodeFn>,
}

static CODECS: &[Codec] = &[
    Codec {
        mime: "application/json",
        encode: Some(encode_json),
        decode: Some(decode_json),
    },
    Codec {
        mime: "application/hal+json",
        encode: None,
        decode: Some(decode_json),
    },
    Codec {
        mime: "text/json",
        encode: None,
        decode: Some(decode_json),
    },
    Codec {
        mime: "application/xml",
        encode: Some(encode_raw),
        decode: Some(decode_raw),
    },
    Codec {
        mime: "text/plain",
        encode: Some(encode_raw),
        decode: Some(decode_raw),
    },
    Codec {
        mime: "application/x-www-form-urlencoded",
        encode: Some(encode_form),
        decode: Some(decode_form),
    },
    Codec {
        mime: "multipart/form-data",
        encode: Some(encode_multipart),
        decode: None,
    },
    Codec {
        mime: "text/xml",
        encode: None,
        decode: Some(decode_raw),
    },
    Codec {
        mime: "application/pdf",
        encode: None,
        decode: Some(decode_raw),
    },
    Codec {
        mime: "image/png",
        encode: None,
        decode: Some(decode_raw),
    },
    Codec {
        mime: "image/jpg",
        encode: None,
        decode: Some(decode_raw),
    },
    Codec {
        mime: "image/jpeg",
        encode: None,
        decode: Some(decode_raw),
    },
    Codec {
        mime: "text/html",
        encode: None,
        decode: Some(decode_raw),
    },
    Codec {
        mime: "text/csv",
        encode: None,
        decode: Some(decode_raw),
    },
];

/// Lowercased MIME type with any `;` parameters removed.
pub fn base_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// True when `mime` names a type requests can be encoded as. Matching is
/// case-insensitive; parameters are not accepted.
pub fn is_encodable(mime: &str) -> bool {
    CODECS
        .iter()
        .any(|codec| codec.encode.is_some() && codec.mime.eq_ignore_ascii_case(mime))
}

fn lookup(mime: &str) -> Option<&'static Codec> {
    CODECS.iter().find(|codec| codec.mime == mime)
}

/// Encode a request payload for `content_type`.
///
/// A missing payload (`Null`) and bare non-string scalars are rejected before
/// dispatch; each codec then checks the shape it needs.
pub fn encode(
    content_type: Option<&str>,
    payload: &Value,
    options: &JsonOptions,
) -> Result<RequestBody, ApiError> {
    match payload {
        Value::Null => {
            return Err(ApiError::InvalidPayload("a payload is required".into()));
        }
        Value::Bool(_) | Value::Number(_) => {
            return Err(ApiError::InvalidPayload(format!(
                "expected a mapping, got scalar {payload}"
            )));
        }
        _ => {}
    }

    let mime = content_type.map(base_mime).unwrap_or_default();
    trace!(%mime, "encoding request body");
    let encoder = lookup(&mime)
        .and_then(|codec| codec.encode)
        .ok_or_else(|| ApiError::UnsupportedContentType(mime.clone()))?;
    encoder(payload, options)
}

/// Decode a response body as `content_type`. Empty bodies are never decoded.
pub fn decode(
    content_type: Option<&str>,
    body: &[u8],
    options: &JsonOptions,
) -> Result<ResponseBody, ApiError> {
    if body.is_empty() {
        return Ok(ResponseBody::Empty);
    }

    let mime = content_type.map(base_mime).unwrap_or_default();
    trace!(%mime, len = body.len(), "decoding response body");
    let decoder = lookup(&mime)
        .and_then(|codec| codec.decode)
        .ok_or_else(|| ApiError::UnsupportedContentType(mime.clone()))?;
    decoder(body, options)
}

fn encode_json(payload: &Value, options: &JsonOptions) -> Result<RequestBody, ApiError> {
    if !(payload.is_object() || payload.is_array()) {
        return Err(ApiError::InvalidPayload(
            "application/json needs a mapping or sequence".into(),
        ));
    }
    json::encode(payload, options)
        .map(RequestBody::Bytes)
        .map_err(|e| ApiError::EncodingError(e.to_string()))
}

fn encode_raw(payload: &Value, _: &JsonOptions) -> Result<RequestBody, ApiError> {
    match payload {
        Value::String(text) => Ok(RequestBody::Bytes(text.clone().into_bytes())),
        _ => Err(ApiError::InvalidPayload(
            "raw content types need a string payload".into(),
        )),
    }
}

fn encode_form(payload: &Value, _: &JsonOptions) -> Result<RequestBody, ApiError> {
    let fields = payload.as_object().ok_or_else(|| {
        ApiError::InvalidPayload("form bodies need a flat mapping".into())
    })?;
    serde_urlencoded::to_string(fields)
        .map(|encoded| RequestBody::Bytes(encoded.into_bytes()))
        .map_err(|e| ApiError::EncodingError(e.to_string()))
}

fn encode_multipart(payload: &Value, _: &JsonOptions) -> Result<RequestBody, ApiError> {
    payload
        .as_object()
        .map(|fields| RequestBody::Multipart(fields.clone()))
        .ok_or_else(|| ApiError::InvalidPayload("multipart bodies need a mapping".into()))
}

fn decode_json(body: &[u8], options: &JsonOptions) -> Result<ResponseBody, ApiError> {
    json::decode(body, options)
        .map(ResponseBody::Json)
        .map_err(|e| ApiError::DecodingError(e.to_string()))
}

fn decode_form(body: &[u8], _: &JsonOptions) -> Result<ResponseBody, ApiError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
        .map_err(|e| ApiError::DecodingError(e.to_string()))?;
    Ok(ResponseBody::Form(pairs.into_iter().collect::<BTreeMap<_, _>>()))
}

fn decode_raw(body: &[u8], _: &JsonOptions) -> Result<ResponseBody, ApiError> {
    Ok(ResponseBody::Raw(body.to_vec()))
}
