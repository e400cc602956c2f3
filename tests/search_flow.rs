// End-to-end search and auth behavior against an in-process mock of the REST API.

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use support::*;
use unisearch::api::ApiClient;
use unisearch::auth::{AuthCredential, AuthService, AuthStore};
use unisearch::search::{CloudType, ParamsPatch, SearchOutcome, SearchStore};
use unisearch::storage::{FileStorage, MemoryStorage, SharedStorage, SEARCH_HISTORY_KEY};

fn user() -> AuthCredential { AuthCredential::UserSession { api_key: VALID_KEY.to_string() } }

#[tokio::test]
async fn search_sorts_groups_and_persists_history() {
    let (base, mock) = start_mock().await;
    let tmp = tempfile::tempdir().expect("tempdir");
    let storage: SharedStorage = Arc::new(FileStorage::open(tmp.path()).expect("open storage"));
    let store = SearchStore::new(client(&base, storage.clone(), user(), "/"), storage.clone());

    let outcome = store.search(Some(ParamsPatch::keyword("  rust book "))).await;
    assert_eq!(outcome, SearchOutcome::Completed { total: 3 });
    assert_eq!(mock.search_calls.load(Ordering::SeqCst), 1);

    let sent = mock.last_search_body.lock().clone().expect("request body");
    assert_eq!(sent["kw"], "rust book");

    let urls: Vec<String> = store.sorted_results().iter().map(|i| i.link.url.clone()).collect();
    assert_eq!(urls, vec!["a", "b", "c"]);
    assert_eq!(store.sorted_results()[2].cloud_type, CloudType::Magnet);

    let state = store.snapshot();
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert_eq!(store.history(), vec!["rust book".to_string()]);

    // history survives a fresh store over the same directory
    let reopened: SharedStorage = Arc::new(FileStorage::open(tmp.path()).expect("reopen"));
    assert!(reopened.get(SEARCH_HISTORY_KEY).expect("read").is_some());
    let again = SearchStore::new(client(&base, reopened.clone(), user(), "/"), reopened);
    assert_eq!(again.history(), vec!["rust book".to_string()]);
}

#[tokio::test]
async fn large_result_set_is_paged() {
    let (base, _mock) = start_mock().await;
    let storage: SharedStorage = Arc::new(MemoryStorage::new());
    let store = SearchStore::new(client(&base, storage.clone(), user(), "/"), storage);

    assert_eq!(store.search(Some(ParamsPatch::keyword("many"))).await, SearchOutcome::Completed { total: 60 });
    assert_eq!(store.displayed_results().len(), 48);
    assert!(store.snapshot().pagination.has_more);
    assert!(store.load_more());
    assert_eq!(store.displayed_results().len(), 60);
    assert!(!store.load_more());
}

#[tokio::test]
async fn malformed_links_are_dropped_not_fatal() {
    let (base, _mock) = start_mock().await;
    let storage: SharedStorage = Arc::new(MemoryStorage::new());
    let store = SearchStore::new(client(&base, storage.clone(), user(), "/"), storage);

    assert_eq!(store.search(Some(ParamsPatch::keyword("loose"))).await, SearchOutcome::Completed { total: 2 });
    let urls: Vec<String> = store.sorted_results().iter().map(|i| i.link.url.clone()).collect();
    assert_eq!(urls, vec!["dated", "epoch"]);
    assert!(store.snapshot().error.is_none());
}

#[tokio::test]
async fn envelope_and_http_errors_land_in_state() {
    let (base, _mock) = start_mock().await;
    let storage: SharedStorage = Arc::new(MemoryStorage::new());
    let store = SearchStore::new(client(&base, storage.clone(), user(), "/"), storage);

    assert_eq!(store.search(Some(ParamsPatch::keyword("blocked"))).await, SearchOutcome::Failed);
    assert_eq!(store.snapshot().error.as_deref(), Some("keyword blocked"));
    assert!(store.snapshot().results.is_none());

    assert_eq!(store.search(Some(ParamsPatch::keyword("crash"))).await, SearchOutcome::Failed);
    assert_eq!(store.snapshot().error.as_deref(), Some("internal server error"));
    assert!(store.history().is_empty());
}

#[tokio::test]
async fn network_failure_reports_connection_message() {
    let storage: SharedStorage = Arc::new(MemoryStorage::new());
    // nothing listens on the discard port
    let store = SearchStore::new(client("http://127.0.0.1:9/api", storage.clone(), user(), "/"), storage);
    assert_eq!(store.search(Some(ParamsPatch::keyword("rust"))).await, SearchOutcome::Failed);
    let err = store.snapshot().error.expect("error message");
    assert!(err.contains("network connection failed"), "got {err}");
    assert!(!store.snapshot().loading);
}

#[tokio::test]
async fn unauthorized_search_logs_out_and_redirects() {
    let (base, _mock) = start_mock().await;
    let storage: SharedStorage = Arc::new(MemoryStorage::new());
    let cred = AuthCredential::UserSession { api_key: REVOKED_KEY.to_string() };
    let api = client(&base, storage.clone(), cred, "/");
    let store = SearchStore::new(api.clone(), storage);

    assert_eq!(store.search(Some(ParamsPatch::keyword("rust"))).await, SearchOutcome::Failed);
    assert_eq!(store.snapshot().error.as_deref(), Some("unauthorized"));
    assert!(!api.auth().is_authenticated());
    assert_eq!(api.navigator().current(), "/login");
}

#[tokio::test]
async fn unauthorized_on_admin_route_goes_to_admin_login() {
    let (base, _mock) = start_mock().await;
    let storage: SharedStorage = Arc::new(MemoryStorage::new());
    let cred = AuthCredential::AdminSession { token: "expired".into(), username: "admin".into() };
    let api = client(&base, storage, cred, "/admin");

    let err = api.get::<serde_json::Value>("admin/keys").await.expect_err("401");
    assert_eq!(err.code, 401);
    assert_eq!(api.navigator().current(), "/admin/login");
    assert!(!api.auth().is_authenticated());
}

#[tokio::test]
async fn unauthorized_on_login_route_does_not_navigate() {
    let (base, _mock) = start_mock().await;
    let storage: SharedStorage = Arc::new(MemoryStorage::new());
    let cred = AuthCredential::UserSession { api_key: REVOKED_KEY.to_string() };
    let api = client(&base, storage, cred, "/login?next=%2F");

    let err = api.post::<_, serde_json::Value>("search", &serde_json::json!({"kw": "x"})).await.expect_err("401");
    assert!(err.is_unauthorized());
    assert_eq!(api.navigator().current(), "/login?next=%2F");
    assert!(!api.auth().is_authenticated());
}

#[tokio::test]
async fn health_options_fill_channel_and_plugin_lists() {
    let (base, _mock) = start_mock().await;
    let storage: SharedStorage = Arc::new(MemoryStorage::new());
    let store = SearchStore::new(client(&base, storage.clone(), AuthCredential::Anonymous, "/"), storage);
    assert!(store.load_available_options().await);
    let s = store.snapshot();
    assert_eq!(s.available_channels, vec!["tgsearchers3".to_string(), "Aliyun_4K_Movies".to_string()]);
    assert_eq!(s.available_plugins, vec!["pansearch".to_string(), "hunhepan".to_string()]);
}

#[tokio::test]
async fn api_key_login_accepts_known_key_only() {
    let (base, _mock) = start_mock().await;
    let storage: SharedStorage = Arc::new(MemoryStorage::new());
    let api: ApiClient = client(&base, storage.clone(), AuthCredential::Anonymous, "/login");
    let auth = AuthService::new(api.clone());

    let err = auth.login_with_api_key("not-a-key").await.expect_err("format");
    assert_eq!(err.code_str(), "invalid_api_key_format");

    let err = auth.login_with_api_key(REVOKED_KEY).await.expect_err("rejected");
    assert_eq!(err.code_str(), "invalid_api_key");
    assert!(!api.auth().is_authenticated());
    // a rejected probe stays on the login page
    assert_eq!(api.navigator().current(), "/login");

    auth.login_with_api_key(VALID_KEY).await.expect("login");
    assert_eq!(api.auth().api_key().as_deref(), Some(VALID_KEY));

    // persisted credential is picked up by a fresh store
    let restored = AuthStore::load(storage);
    assert_eq!(restored.api_key().as_deref(), Some(VALID_KEY));
    assert!(!restored.is_admin());
}
