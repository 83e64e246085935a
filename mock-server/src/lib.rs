use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// Bytes served by `/image`: a PNG signature followed by bytes that are not
/// valid UTF-8.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0xff, 0x00, 0xfe];

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Default)]
pub struct Store {
    next_id: u64,
    items: HashMap<u64, Map<String, Value>>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/no-content", any(no_content))
        .route("/form", get(form))
        .route("/image", get(image))
        .route("/text", get(text))
        .route("/ambiguous", get(ambiguous))
        .route("/unsupported", get(unsupported))
        .route("/slow/{millis}", get(slow))
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn status(Path(code): Path<u16>) -> Response {
    let Ok(status) = StatusCode::from_u16(code) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    if status == StatusCode::NO_CONTENT {
        return status.into_response();
    }
    let reason = status
        .canonical_reason()
        .unwrap_or("unknown")
        .to_ascii_lowercase();
    (status, Json(json!({ "error": reason }))).into_response()
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn form() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "application/x-www-form-urlencoded")],
        "token=abc&expires=3600&scope=read+write",
    )
}

async fn image() -> impl IntoResponse {
    ([(CONTENT_TYPE, "image/png")], PNG_BYTES)
}

async fn text() -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/plain; charset=utf-8")], "hello, world")
}

async fn ambiguous() -> Response {
    let mut response = Response::new(Body::from(r#"{"ambiguous":true}"#));
    let headers = response.headers_mut();
    headers.append(CONTENT_TYPE, HeaderValue::from_static("text/html"));
    headers.append(CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    response
}

async fn unsupported() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/octet-stream")], vec![1u8, 2, 3])
}

/// Answers after sleeping `millis`, for exercising client timeouts.
async fn slow(Path(millis): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    Json(json!({ "slept": millis }))
}

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

fn with_id(id: u64, fields: &Map<String, Value>) -> Value {
    let mut item = fields.clone();
    item.insert("id".to_string(), json!(id));
    Value::Object(item)
}

async fn list_items(State(db): State<Db>) -> Json<Vec<Value>> {
    let store = db.read().await;
    let mut ids: Vec<&u64> = store.items.keys().collect();
    ids.sort();
    Json(ids.into_iter().map(|id| with_id(*id, &store.items[id])).collect())
}

async fn create_item(
    State(db): State<Db>,
    Json(input): Json<Map<String, Value>>,
) -> (StatusCode, Json<Value>) {
    let mut store = db.write().await;
    store.next_id += 1;
    let id = store.next_id;
    let item = with_id(id, &input);
    store.items.insert(id, input);
    (StatusCode::CREATED, Json(item))
}

async fn get_item(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let store = db.read().await;
    store
        .items
        .get(&id)
        .map(|fields| Json(with_id(id, fields)))
        .ok_or_else(not_found)
}

async fn update_item(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<Map<String, Value>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    let fields = store.items.get_mut(&id).ok_or_else(not_found)?;
    fields.extend(input);
    Ok(Json(with_id(id, fields)))
}

async fn delete_item(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    store
        .items
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(not_found)
}
