//! Decoded response bodies.
//!
//! # Design
//! A response can carry JSON, a flat form mapping, or an opaque byte payload,
//! so the decoded value is a tagged union rather than a fixed structure. JSON
//! stays as `serde_json::Value`; callers deserialize into their own DTOs with
//! `serde_json::from_value` when they know the shape.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// A response body after content-type dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// The response had no body; nothing was decoded.
    Empty,

    /// `application/json` and friends.
    Json(Value),

    /// `application/x-www-form-urlencoded`. Later duplicates win.
    Form(BTreeMap<String, String>),

    /// Opaque formats (xml, html, csv, images, pdf) returned byte-exact.
    Raw(Vec<u8>),
}

impl ResponseBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, ResponseBody::Empty)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_form(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ResponseBody::Form(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ResponseBody::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Empty => Ok(()),
            ResponseBody::Json(value) => write!(f, "{value}"),
            ResponseBody::Form(fields) => {
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("&")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                Ok(())
            }
            ResponseBody::Raw(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}
