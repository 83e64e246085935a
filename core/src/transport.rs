//! Blocking transport over ureq.
//!
//! # Design
//! The agent is built with `http_status_as_error(false)` so 4xx/5xx answers
//! come back as data and the client does its own status classification. Every
//! failure before a response exists is mapped to a `TransportError` with a
//! short code. Multipart boundaries and file parts are handled here, never in
//! the client.

use std::path::Path;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, RequestBody, ResponseHeaders, Transport, TransportError,
};

/// Largest response body read into memory by default (10 MiB).
pub const DEFAULT_BODY_LIMIT: u64 = 10 * 1024 * 1024;

/// Settings for `UreqTransport`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Deadline for the whole exchange. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Maximum response body size in bytes.
    pub body_limit: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

/// `Transport` implementation backed by a `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    body_limit: u64,
}

impl UreqTransport {
    pub fn new(config: TransportConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self {
            agent,
            body_limit: config.body_limit,
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let multipart = match &request.body {
            Some(RequestBody::Multipart(fields)) => Some(multipart_body(fields)?),
            _ => None,
        };

        let headers: Vec<(&str, &str)> = request
            .header_lines
            .iter()
            .filter_map(|line| split_header_line(line))
            .filter(|(name, _)| multipart.is_none() || !name.eq_ignore_ascii_case("content-type"))
            .collect();

        let url = request.url.as_str();
        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), &headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), &headers).call(),
            HttpMethod::Post => send(
                with_headers(self.agent.post(url), &headers),
                request.body.as_ref(),
                multipart.as_ref(),
            ),
            HttpMethod::Put => send(
                with_headers(self.agent.put(url), &headers),
                request.body.as_ref(),
                multipart.as_ref(),
            ),
        };

        let mut response = result.map_err(|e| {
            let err = transport_error(e);
            warn!(method = %request.method, url, code = %err.code, "transport failed");
            err
        })?;

        let status = response.status().as_u16();
        let mut response_headers = ResponseHeaders::new();
        for (name, value) in response.headers() {
            response_headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }
        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_vec()
            .map_err(transport_error)?;

        debug!(status, len = body.len(), "response received");
        Ok(HttpResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(&str, &str)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder
}

fn send(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&RequestBody>,
    multipart: Option<&(String, Vec<u8>)>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match (body, multipart) {
        (_, Some((boundary, bytes))) => builder
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .send(&bytes[..]),
        (Some(RequestBody::Bytes(bytes)), None) => builder.send(&bytes[..]),
        _ => builder.send_empty(),
    }
}

/// Split `name: value` on the first colon. Lines without one are dropped.
fn split_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    Some((name.trim(), value.trim()))
}

fn transport_error(err: ureq::Error) -> TransportError {
    let code = match &err {
        ureq::Error::Timeout(_) => "timeout",
        ureq::Error::HostNotFound => "host_not_found",
        ureq::Error::ConnectionFailed => "connection_failed",
        ureq::Error::Io(_) => "io",
        ureq::Error::BadUri(_) => "bad_uri",
        ureq::Error::BodyExceedsLimit(_) => "body_limit",
        _ => "http",
    };
    TransportError::new(code, err.to_string())
}

struct FileField<'a> {
    path: &'a str,
    filename: Option<&'a str>,
    content_type: Option<&'a str>,
}

/// An object field shaped like `{"file": "<path>", "filename"?, "content_type"?}`
/// is uploaded as a file part.
fn file_field(value: &Value) -> Option<FileField<'_>> {
    let fields = value.as_object()?;
    Some(FileField {
        path: fields.get("file")?.as_str()?,
        filename: fields.get("filename").and_then(Value::as_str),
        content_type: fields.get("content_type").and_then(Value::as_str),
    })
}

/// Escape a `Content-Disposition` parameter the way browsers encode form
/// data: `"`, CR and LF are percent-encoded, everything else is kept.
fn quoted(s: &str) -> String {
    s.replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn multipart_body(fields: &Map<String, Value>) -> Result<(String, Vec<u8>), TransportError> {
    let boundary = format!("------------------------{}", Uuid::new_v4().simple());
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match file_field(value) {
            Some(file) => {
                let contents = std::fs::read(file.path)
                    .map_err(|e| TransportError::new("file", format!("{}: {e}", file.path)))?;
                let filename = file.filename.map(str::to_string).unwrap_or_else(|| {
                    Path::new(file.path)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default()
                });
                let content_type = file.content_type.unwrap_or("application/octet-stream");
                let disposition = format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    quoted(name),
                    quoted(&filename),
                );
                body.extend_from_slice(disposition.as_bytes());
                body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
                body.extend_from_slice(&contents);
            }
            None => {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                let disposition =
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n", quoted(name));
                body.extend_from_slice(disposition.as_bytes());
                body.extend_from_slice(b"\r\n");
                body.extend_from_slice(text.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Ok((boundary, body))
}
