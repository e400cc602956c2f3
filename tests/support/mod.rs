// In-process stand-in for the UniSearch REST API on an ephemeral port.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use unisearch::api::{ApiClient, Navigator};
use unisearch::auth::{AuthCredential, AuthStore};
use unisearch::config::ClientConfig;
use unisearch::storage::SharedStorage;

pub const VALID_KEY: &str = "sk-0123456789abcdef0123456789abcdef01234567";
/// Well-formed but unknown to the server.
pub const REVOKED_KEY: &str = "sk-ffffffffffffffffffffffffffffffffffffffff";
pub const ADMIN_PASSWORD: &str = "secret";
pub const ADMIN_TOKEN: &str = "jwt-test-token";

#[derive(Default)]
pub struct MockState {
    pub search_calls: AtomicUsize,
    pub last_search_body: parking_lot::Mutex<Option<Value>>,
    pub last_login_body: parking_lot::Mutex<Option<Value>>,
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized", "code": "AUTH_REQUIRED"}))).into_response()
}

fn has_user_access(h: &HeaderMap) -> bool {
    let key_ok = h.get("x-api-key").and_then(|v| v.to_str().ok()) == Some(VALID_KEY);
    key_ok || is_admin(h)
}

fn is_admin(h: &HeaderMap) -> bool {
    h.get("authorization").and_then(|v| v.to_str().ok()) == Some(&format!("Bearer {}", ADMIN_TOKEN)[..])
}

fn key_record(key: &str, description: &str) -> Value {
    json!({
        "key": key,
        "created_at": "2025-01-01T00:00:00Z",
        "first_used_at": null,
        "expires_at": "2099-01-01T00:00:00Z",
        "ttl_hours": 24,
        "is_enabled": true,
        "description": description,
    })
}

async fn search(State(st): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !has_user_access(&headers) { return unauthorized(); }
    st.search_calls.fetch_add(1, Ordering::SeqCst);
    *st.last_search_body.lock() = Some(body.clone());
    let kw = body.get("kw").and_then(Value::as_str).unwrap_or("");
    match kw {
        "blocked" => Json(json!({"code": 1001, "message": "keyword blocked"})).into_response(),
        "crash" => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"}))).into_response(),
        "loose" => Json(json!({
            "code": 0,
            "data": {
                "total": 3,
                "merged_by_type": {
                    "baidu": [
                        {"url": "epoch", "password": "", "datetime": 1704067200},
                        {"password": "orphan"},
                        {"url": "dated", "datetime": "2024-01-01 00:00:00"}
                    ]
                }
            }
        }))
        .into_response(),
        "many" => {
            let links: Vec<Value> = (0..60).map(|i| json!({"url": format!("https://pan.quark.cn/s/{}", i), "password": "", "note": "n"})).collect();
            Json(json!({"code": 0, "message": "success", "data": {"total": 60, "merged_by_type": {"quark": links}}})).into_response()
        }
        _ => Json(json!({
            "code": 0,
            "message": "success",
            "data": {
                "total": 3,
                "merged_by_type": {
                    "magnet": [{"url": "c", "password": "", "note": "seed", "datetime": "2025-06-01T00:00:00Z"}],
                    "quark": [
                        {"url": "a", "password": "", "note": "new", "datetime": "2024-01-02T00:00:00Z"},
                        {"url": "b", "password": "x1", "note": "old", "datetime": "2024-01-01T00:00:00Z"}
                    ]
                }
            }
        }))
        .into_response(),
    }
}

async fn health(headers: HeaderMap) -> Response {
    if headers.contains_key("x-api-key") && !has_user_access(&headers) { return unauthorized(); }
    Json(json!({
        "status": "ok",
        "auth_enabled": true,
        "plugins_enabled": true,
        "plugins": {"count": 2, "names": ["pansearch", "hunhepan"]},
        "channels": ["tgsearchers3", "Aliyun_4K_Movies"]
    }))
    .into_response()
}

async fn admin_login(State(st): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    *st.last_login_body.lock() = Some(body.clone());
    if body.get("password").and_then(Value::as_str) != Some(ADMIN_PASSWORD) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid password", "code": "INVALID_PASSWORD"}))).into_response();
    }
    Json(json!({"token": ADMIN_TOKEN, "expires_at": 4102444800i64})).into_response()
}

async fn list_keys(headers: HeaderMap) -> Response {
    if !is_admin(&headers) { return unauthorized(); }
    Json(json!({"keys": [key_record(VALID_KEY, "ci"), key_record(REVOKED_KEY, "old")]})).into_response()
}

async fn create_key(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !is_admin(&headers) { return unauthorized(); }
    let desc = body.get("description").and_then(Value::as_str).unwrap_or("");
    Json(json!({"key": key_record("sk-1111111111111111111111111111111111111111", desc)})).into_response()
}

async fn delete_key(headers: HeaderMap, Path(key): Path<String>) -> Response {
    if !is_admin(&headers) { return unauthorized(); }
    if key != VALID_KEY { return (StatusCode::NOT_FOUND, Json(json!({"error": "no such key"}))).into_response(); }
    Json(json!({"message": "deleted"})).into_response()
}

async fn update_key(headers: HeaderMap, Path(key): Path<String>, Json(body): Json<Value>) -> Response {
    if !is_admin(&headers) { return unauthorized(); }
    let mut rec = key_record(&key, "ci");
    if let Some(at) = body.get("expires_at") { rec["expires_at"] = at.clone(); }
    Json(json!({"key": rec})).into_response()
}

async fn batch_delete(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !is_admin(&headers) { return unauthorized(); }
    let keys = body.get("keys").and_then(Value::as_array).cloned().unwrap_or_default();
    let ok = keys.iter().filter(|k| k.as_str() == Some(VALID_KEY)).count();
    Json(json!({"success_count": ok, "failed_count": keys.len() - ok})).into_response()
}

async fn batch_create(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !is_admin(&headers) { return unauthorized(); }
    let n = body.get("count").and_then(Value::as_u64).unwrap_or(0);
    let keys: Vec<Value> = (0..n).map(|i| key_record(&format!("sk-{:040x}", i), "batch")).collect();
    Json(json!({"success_count": n, "failed_count": 0, "keys": keys})).into_response()
}

async fn batch_extend(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !is_admin(&headers) { return unauthorized(); }
    let n = body.get("keys").and_then(Value::as_array).map(|a| a.len()).unwrap_or(0);
    Json(json!({"success_count": n, "failed_count": 0})).into_response()
}

/// Starts the mock and returns its `/api` base URL.
pub async fn start_mock() -> (String, Arc<MockState>) {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/api/search", post(search))
        .route("/api/health", get(health))
        .route("/api/admin/login", post(admin_login))
        .route("/api/admin/keys", get(list_keys).post(create_key))
        .route("/api/admin/keys/batch-delete", post(batch_delete))
        .route("/api/admin/keys/batch-create", post(batch_create))
        .route("/api/admin/keys/batch-extend", post(batch_extend))
        .route("/api/admin/keys/{key}", patch(update_key).delete(delete_key))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr: SocketAddr = listener.local_addr().expect("local addr");
    unisearch::tprintln!("[mock] listening on {}", addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("mock server error: {e:?}"); }
    });
    (format!("http://{}/api", addr), state)
}

pub fn client(base: &str, storage: SharedStorage, cred: AuthCredential, route: &str) -> ApiClient {
    let cfg = ClientConfig { api_base: base.to_string(), ..Default::default() };
    let auth = Arc::new(AuthStore::with_state(storage, cred));
    ApiClient::new(&cfg, auth, Arc::new(Navigator::new(route))).expect("api client")
}
