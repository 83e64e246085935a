//! Verify request building and response parsing against the JSON test vectors
//! stored in `test-vectors/`.
//!
//! Each vector file describes inputs and expected outputs. Bodies are compared
//! as parsed JSON where the codec is JSON, so key ordering never matters.

use rest_core::{
    ApiError, HttpMethod, HttpResponse, RequestBody, RequestClient, ResponseBody, ResponseHeaders,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn error_kind(err: &ApiError) -> &'static str {
    match err {
        ApiError::InvalidConfiguration(_) => "InvalidConfiguration",
        ApiError::InvalidPayload(_) => "InvalidPayload",
        ApiError::UnsupportedContentType(_) => "UnsupportedContentType",
        ApiError::EncodingError(_) => "EncodingError",
        ApiError::DecodingError(_) => "DecodingError",
        ApiError::TransportError { .. } => "TransportError",
        ApiError::HttpStatusError { .. } => "HttpStatusError",
    }
}

/// Compare a decoded body with the `value`/`raw` fields of an expectation.
fn assert_body(name: &str, kind: &str, body: &ResponseBody, expected: &Value) {
    match kind {
        "empty" => assert_eq!(body, &ResponseBody::Empty, "{name}"),
        "json" => assert_eq!(body.as_json(), Some(&expected["value"]), "{name}"),
        "form" => {
            let fields = serde_json::to_value(body.as_form().expect("form body")).unwrap();
            assert_eq!(fields, expected["value"], "{name}");
        }
        "raw" => assert_eq!(
            body.as_bytes(),
            expected["value"].as_str().map(str::as_bytes),
            "{name}"
        ),
        other => panic!("{name}: unknown body kind {other}"),
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

#[test]
fn decode_test_vectors() {
    let raw = include_str!("../../test-vectors/decode.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let mut client = RequestClient::new(BASE_URL);
        if let Some(mime) = case["configured_content_type"].as_str() {
            client = client.set_content_type(mime).unwrap();
        }

        let sim = &case["response"];
        let headers: ResponseHeaders = sim["content_types"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| ("Content-Type", v.as_str().unwrap()))
            .collect();
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers,
            body: sim["body"].as_str().unwrap().as_bytes().to_vec(),
        };

        let expected = &case["expected"];
        let kind = expected["kind"].as_str().unwrap();
        let result = client.parse_response(response);

        match kind {
            "error" => {
                let err = result.unwrap_err();
                assert_eq!(error_kind(&err), expected["error"], "{name}");
            }
            "http_status" => match result.unwrap_err() {
                ApiError::HttpStatusError { status, body } => {
                    assert_eq!(u64::from(status), expected["status"], "{name}: status");
                    if expected.get("value").is_some() {
                        assert_body(name, "json", &body, expected);
                    } else if let Some(raw) = expected["raw"].as_str() {
                        assert_eq!(body.as_bytes(), Some(raw.as_bytes()), "{name}: raw");
                    } else {
                        assert!(body.is_empty(), "{name}: body should be empty");
                    }
                }
                other => panic!("{name}: expected HttpStatusError, got {other:?}"),
            },
            _ => assert_body(name, kind, &result.unwrap(), expected),
        }
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

#[test]
fn encode_test_vectors() {
    let raw = include_str!("../../test-vectors/encode.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let client = RequestClient::new(BASE_URL)
            .set_content_type(case["content_type"].as_str().unwrap())
            .unwrap();
        let method = parse_method(case["method"].as_str().unwrap());
        let payload = match &case["payload"] {
            Value::Null => None,
            other => Some(other),
        };

        let expected = &case["expected"];
        let result = client.build_request(method, case["target"].as_str().unwrap(), payload);

        if let Some(expected_error) = expected.get("error") {
            let err = result.unwrap_err();
            assert_eq!(error_kind(&err), *expected_error, "{name}");
            continue;
        }

        let req = result.unwrap();
        assert_eq!(req.method, method, "{name}: method");
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(
            *req.header_lines,
            [format!("content-type: {}", case["content_type"].as_str().unwrap())],
            "{name}: headers"
        );

        match (req.body, expected["body"].as_str()) {
            (None, None) => {}
            (Some(RequestBody::Bytes(bytes)), Some(body)) => {
                if case["content_type"] == "application/json" {
                    let sent: Value = serde_json::from_slice(&bytes).unwrap();
                    let want: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(sent, want, "{name}: body");
                } else {
                    assert_eq!(bytes, body.as_bytes(), "{name}: body");
                }
            }
            (got, want) => panic!("{name}: body mismatch: {got:?} vs {want:?}"),
        }
    }
}
