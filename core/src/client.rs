//! Immutable REST client configuration and the request pipeline.
//!
//! # Design
//! `RequestClient` holds a base URL, a header mapping and a JSON option set.
//! Setters take `&self` and return a new client; nothing is ever changed in
//! place, so one client can be shared across threads and reused for any
//! number of calls.
//!
//! A call goes through `build_request` (resolve the URL, encode the payload,
//! attach header lines), a `Transport`, then `parse_response` (decode the
//! body, classify the status). The two halves are public so callers that do
//! their own I/O can drive them directly.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::codec;
use crate::error::ApiError;
use crate::headers::{HeaderOptions, Headers};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody, Transport};
use crate::json::JsonOptions;
use crate::types::ResponseBody;

const CONTENT_TYPE: &str = "content-type";
const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Immutable client for a REST API rooted at `base_url`.
pub struct RequestClient {
    base_url: String,
    headers: Headers,
    json_options: JsonOptions,
    /// Flattened `headers`, filled on first use and shared with every request
    /// built from this instance. Not part of the logical state.
    header_lines: OnceLock<Arc<[String]>>,
}

impl RequestClient {
    /// Client with the default `content-type: application/json` header.
    pub fn new(base_url: &str) -> Self {
        Self::with_parts(base_url, None, None)
    }

    /// Client from explicit parts. `None` headers fall back to the default
    /// JSON content type; `Some` is used as given.
    pub fn with_parts(
        base_url: &str,
        headers: Option<Headers>,
        json_options: Option<JsonOptions>,
    ) -> Self {
        let headers = headers.unwrap_or_else(|| {
            [(CONTENT_TYPE, DEFAULT_CONTENT_TYPE)].into_iter().collect()
        });
        Self::from_fields(
            base_url.to_string(),
            headers,
            json_options.unwrap_or_default(),
        )
    }

    fn from_fields(base_url: String, headers: Headers, json_options: JsonOptions) -> Self {
        Self {
            base_url,
            headers,
            json_options,
            header_lines: OnceLock::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn json_options(&self) -> &JsonOptions {
        &self.json_options
    }

    /// The configured request content type, looked up case-insensitively.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .or_else(|| self.headers.get_ignore_case(CONTENT_TYPE))
    }

    /// Header lines handed to the transport. Computed once per instance.
    ///
    /// Every ASCII-case spelling of `content-type` collapses into a single
    /// `content-type` line carrying `content_type()`, the value the codec
    /// encodes with, at the position of the first spelling.
    pub fn header_lines(&self) -> &[String] {
        self.shared_header_lines()
    }

    fn shared_header_lines(&self) -> &Arc<[String]> {
        self.header_lines.get_or_init(|| {
            let content_type = self.content_type();
            let mut content_type_emitted = false;
            self.headers
                .iter()
                .filter_map(|(name, value)| {
                    if !name.eq_ignore_ascii_case(CONTENT_TYPE) {
                        return Some(format!("{name}: {value}"));
                    }
                    if content_type_emitted {
                        return None;
                    }
                    content_type_emitted = true;
                    content_type.map(|mime| format!("{CONTENT_TYPE}: {mime}"))
                })
                .collect()
        })
    }

    #[must_use]
    pub fn set_base_url(&self, url: &str) -> RequestClient {
        Self::from_fields(
            url.to_string(),
            self.headers.clone(),
            self.json_options.clone(),
        )
    }

    /// Set the request content type. Only types the client can encode are
    /// accepted; the stored value is lowercased.
    #[must_use = "the receiver is unchanged; use the returned client"]
    pub fn set_content_type(&self, mime: &str) -> Result<RequestClient, ApiError> {
        if !codec::is_encodable(mime) {
            return Err(ApiError::InvalidConfiguration(format!(
                "unsupported content type {mime:?}"
            )));
        }
        Ok(self.add_header(
            CONTENT_TYPE,
            &mime.to_ascii_lowercase(),
            HeaderOptions::default(),
        ))
    }

    /// Add or overwrite one header, returning the new client. The receiver is
    /// left as it was, so dropping the result is a no-op the compiler flags:
    ///
    /// ```compile_fail
    /// #![deny(unused_must_use)]
    /// use rest_core::{HeaderOptions, RequestClient};
    ///
    /// let c = RequestClient::new("http://localhost:3000");
    /// c.add_header("X-A", "1", HeaderOptions::default());
    /// ```
    #[must_use]
    pub fn add_header(&self, name: &str, value: &str, options: HeaderOptions) -> RequestClient {
        let mut headers = self.headers.clone();
        headers.insert(name, value, options);
        Self::from_fields(self.base_url.clone(), headers, self.json_options.clone())
    }

    #[must_use]
    pub fn set_json_options(&self, options: JsonOptions) -> RequestClient {
        Self::from_fields(self.base_url.clone(), self.headers.clone(), options)
    }

    /// Absolute URLs (those with a host) pass through; anything else is
    /// appended to the base URL with exactly one `/` inserted if missing.
    pub fn resolve(&self, target: &str) -> String {
        let absolute = Url::parse(target)
            .map(|url| url.host_str().is_some())
            .unwrap_or(false);
        if absolute {
            return target.to_string();
        }
        if target.starts_with('/') {
            format!("{}{target}", self.base_url)
        } else {
            format!("{}/{target}", self.base_url)
        }
    }

    /// Encode a request payload as the configured content type.
    pub fn encode(&self, payload: &Value) -> Result<RequestBody, ApiError> {
        codec::encode(self.content_type(), payload, &self.json_options)
    }

    /// Decode a response body. A single declared content type wins; none or
    /// several fall back to the configured request content type.
    pub fn decode(&self, body: &[u8], content_types: &[String]) -> Result<ResponseBody, ApiError> {
        let content_type = match content_types {
            [single] => Some(single.as_str()),
            _ => self.content_type(),
        };
        codec::decode(content_type, body, &self.json_options)
    }

    /// Build the request for `method`. POST and PUT require a payload; GET and
    /// DELETE ignore it.
    pub fn build_request(
        &self,
        method: HttpMethod,
        target: &str,
        payload: Option<&Value>,
    ) -> Result<HttpRequest, ApiError> {
        let url = self.resolve(target);
        let body = if method.has_body() {
            let payload = payload.ok_or_else(|| {
                ApiError::InvalidPayload(format!("{method} requires a payload"))
            })?;
            Some(self.encode(payload)?)
        } else {
            None
        };

        Ok(HttpRequest {
            method,
            url,
            header_lines: Arc::clone(self.shared_header_lines()),
            body,
        })
    }

    /// Decode the body, then classify the status: 2xx is success, anything
    /// else is an `HttpStatusError` carrying the decoded body.
    pub fn parse_response(&self, response: HttpResponse) -> Result<ResponseBody, ApiError> {
        let body = self.decode(&response.body, response.headers.get_all(CONTENT_TYPE))?;
        check_status(response.status, body)
    }

    /// Run the full pipeline over `transport`.
    pub fn send<T: Transport + ?Sized>(
        &self,
        transport: &T,
        method: HttpMethod,
        target: &str,
        payload: Option<&Value>,
    ) -> Result<ResponseBody, ApiError> {
        let request = self.build_request(method, target, payload)?;
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = transport.execute(&request)?;
        self.parse_response(response)
    }

    pub fn get_with<T: Transport + ?Sized>(
        &self,
        transport: &T,
        target: &str,
    ) -> Result<ResponseBody, ApiError> {
        self.send(transport, HttpMethod::Get, target, None)
    }

    pub fn delete_with<T: Transport + ?Sized>(
        &self,
        transport: &T,
        target: &str,
    ) -> Result<ResponseBody, ApiError> {
        self.send(transport, HttpMethod::Delete, target, None)
    }

    pub fn post_with<T: Transport + ?Sized>(
        &self,
        transport: &T,
        target: &str,
        payload: Option<&Value>,
    ) -> Result<ResponseBody, ApiError> {
        self.send(transport, HttpMethod::Post, target, payload)
    }

    pub fn put_with<T: Transport + ?Sized>(
        &self,
        transport: &T,
        target: &str,
        payload: Option<&Value>,
    ) -> Result<ResponseBody, ApiError> {
        self.send(transport, HttpMethod::Put, target, payload)
    }
}

#[cfg(feature = "ureq")]
impl RequestClient {
    pub fn get(&self, target: &str) -> Result<ResponseBody, ApiError> {
        self.get_with(&crate::transport::UreqTransport::default(), target)
    }

    pub fn delete(&self, target: &str) -> Result<ResponseBody, ApiError> {
        self.delete_with(&crate::transport::UreqTransport::default(), target)
    }

    pub fn post(&self, target: &str, payload: Option<&Value>) -> Result<ResponseBody, ApiError> {
        self.post_with(&crate::transport::UreqTransport::default(), target, payload)
    }

    pub fn put(&self, target: &str, payload: Option<&Value>) -> Result<ResponseBody, ApiError> {
        self.put_with(&crate::transport::UreqTransport::default(), target, payload)
    }
}

impl Clone for RequestClient {
    fn clone(&self) -> Self {
        Self::from_fields(
            self.base_url.clone(),
            self.headers.clone(),
            self.json_options.clone(),
        )
    }
}

impl PartialEq for RequestClient {
    fn eq(&self, other: &Self) -> bool {
        self.base_url == other.base_url
            && self.headers == other.headers
            && self.json_options == other.json_options
    }
}

impl Eq for RequestClient {}

impl fmt::Debug for RequestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestClient")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("json_options", &self.json_options)
            .finish()
    }
}

/// Map the status code to success or `HttpStatusError`.
fn check_status(status: u16, body: ResponseBody) -> Result<ResponseBody, ApiError> {
    if (200..=299).contains(&status) {
        return Ok(body);
    }
    Err(ApiError::HttpStatusError { status, body })
}
