use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::navigator::Navigator;
use super::status::{message_for_status, server_message};
use crate::auth::AuthStore;
use crate::config::ClientConfig;
use crate::error::{ApiError, AppResult};

/// `X-API-Key`, lowercased as stored by `HeaderMap`.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Thin wrapper over a shared reqwest client: credential headers, status
/// normalization, envelope unwrapping and the forced logout on 401.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
    auth: Arc<AuthStore>,
    navigator: Arc<Navigator>,
}

impl ApiClient {
    pub fn new(cfg: &ClientConfig, auth: Arc<AuthStore>, navigator: Arc<Navigator>) -> AppResult<Self> {
        let base = cfg.base_url()?;
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| ApiError::client(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { base, client, auth, navigator })
    }

    pub fn base(&self) -> &Url { &self.base }

    pub fn auth(&self) -> &Arc<AuthStore> { &self.auth }

    pub fn navigator(&self) -> &Arc<Navigator> { &self.navigator }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::client(format!("invalid request path '{}': {}", path, e)))
    }

    /// Bearer token wins over API key; nothing when anonymous.
    fn credential_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let cred = self.auth.credential();
        if let Some(token) = cred.token() {
            if let Ok(v) = HeaderValue::from_str(&format!("Bearer {}", token)) { headers.insert(AUTHORIZATION, v); }
        } else if let Some(key) = cred.api_key() {
            if let Ok(v) = HeaderValue::from_str(key) { headers.insert(API_KEY_HEADER, v); }
        }
        headers
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        decode(self.request(Method::GET, path, None, None).await?)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        decode(self.request(Method::POST, path, Some(encode(body)?), None).await?)
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        decode(self.request(Method::PATCH, path, Some(encode(body)?), None).await?)
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        decode(self.request(Method::DELETE, path, None, None).await?)
    }

    /// GET with the given headers instead of the stored credential.
    pub async fn get_with_headers<T: DeserializeOwned>(&self, path: &str, headers: HeaderMap) -> Result<T, ApiError> {
        decode(self.request(Method::GET, path, None, Some(headers)).await?)
    }

    /// Issue one request and return the (envelope-unwrapped) JSON body.
    pub async fn request(&self, method: Method, path: &str, body: Option<Value>, headers: Option<HeaderMap>) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        // explicit headers are a probe; their 401 says nothing about the session
        let uses_session = headers.is_none();
        debug!(target: "unisearch::api", "-> {} {}", method, url);
        let mut req = self.client.request(method.clone(), url.clone()).headers(headers.unwrap_or_else(|| self.credential_headers()));
        if let Some(b) = body.as_ref() {
            req = req.json(b);
        }
        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(target: "unisearch::api", "{} {} failed: {}", method, url, e);
                return Err(ApiError::network());
            }
        };
        let status = resp.status();
        let bytes = match resp.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!(target: "unisearch::api", "{} {} body read failed: {}", method, url, e);
                return Err(ApiError::network());
            }
        };
        let payload: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        debug!(target: "unisearch::api", "<- {} {} status={}", method, url, status.as_u16());

        if !status.is_success() {
            let code = status.as_u16();
            let err = ApiError::new(code as i32, message_for_status(code, server_message(&payload))).with_data(Some(payload));
            if code == 401 && uses_session {
                self.handle_unauthorized();
            }
            return Err(err);
        }
        unwrap_envelope(payload)
    }

    fn handle_unauthorized(&self) {
        warn!(target: "unisearch::api", "unauthorized response; clearing credentials");
        self.auth.logout();
        if !self.navigator.redirect_to_login() {
            debug!(target: "unisearch::api", "already on a login route; no redirect");
        }
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::client(format!("failed to encode request body: {}", e)))
}

fn decode<T: DeserializeOwned>(v: Value) -> Result<T, ApiError> {
    let was_null = v.is_null();
    serde_json::from_value(v).map_err(|e| {
        if was_null { ApiError::client("server returned no data") } else { ApiError::client(format!("unexpected response: {}", e)) }
    })
}

/// `{code, message, data}` with code 0 yields `data`; any other code is an
/// error. Bodies without a numeric `code` pass through untouched.
pub fn unwrap_envelope(body: Value) -> Result<Value, ApiError> {
    let is_envelope = body.get("code").map(Value::is_i64).unwrap_or(false)
        && (body.get("data").is_some() || body.get("message").is_some());
    if !is_envelope {
        return Ok(body);
    }
    let code = body.get("code").and_then(Value::as_i64).unwrap_or_default();
    if code == 0 {
        return Ok(body.get("data").cloned().unwrap_or(Value::Null));
    }
    let message = body.get("message").and_then(Value::as_str).filter(|m| !m.is_empty()).unwrap_or("request failed").to_string();
    Err(ApiError::new(code as i32, message))
}
