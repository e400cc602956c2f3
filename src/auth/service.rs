use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{ApiClient, API_KEY_HEADER};
use crate::error::{AppError, AppResult};

static API_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^sk-[0-9a-f]{40}$").expect("static api key pattern"));

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// `sk-` followed by 40 hex characters, case-insensitive.
pub fn validate_api_key_format(key: &str) -> bool { API_KEY_RE.is_match(key) }

#[derive(Debug, Clone, Serialize)]
pub struct AdminLoginRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdminLoginResponse {
    pub token: String,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// Login flows on top of the API client; successful logins land in its `AuthStore`.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self { Self { api } }

    /// Probe `/health` with only the candidate key attached. Any failure means invalid.
    pub async fn validate_api_key(&self, key: &str) -> bool {
        let Ok(value) = HeaderValue::from_str(key) else { return false };
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, value);
        match self.api.get_with_headers::<Value>("health", headers).await {
            Ok(_) => true,
            Err(e) => {
                debug!(target: "unisearch::auth", "api key probe rejected: {}", e);
                false
            }
        }
    }

    pub async fn login_with_api_key(&self, key: &str) -> AppResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::validation("api_key_empty", "API key must not be empty"));
        }
        if !validate_api_key_format(key) {
            return Err(AppError::validation("invalid_api_key_format", "API key must be sk- followed by 40 hex characters"));
        }
        if !self.validate_api_key(key).await {
            return Err(AppError::auth("invalid_api_key", "API key was rejected by the server"));
        }
        self.api.auth().set_api_key(key);
        Ok(())
    }

    /// `POST /admin/login`; blank usernames fall back to `admin` locally and are
    /// left out of the request.
    pub async fn admin_login(&self, username: Option<&str>, password: &str) -> AppResult<AdminLoginResponse> {
        if password.is_empty() {
            return Err(AppError::validation("password_empty", "password must not be empty"));
        }
        let username = username.map(str::trim).filter(|u| !u.is_empty()).map(str::to_string);
        let body = AdminLoginRequest { username: username.clone(), password: password.to_string() };
        let resp: AdminLoginResponse = self.api.post("admin/login", &body).await?;
        if resp.token.is_empty() {
            return Err(AppError::auth("token_missing", "login response carried no token"));
        }
        let name = username.unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());
        info!(target: "unisearch::auth", "admin login ok for {} (expires {})", name, resp.expires_at.map(|t| t.to_string()).unwrap_or_else(|| "?".to_string()));
        self.api.auth().set_token(resp.token.clone(), name);
        Ok(resp)
    }

    pub fn logout(&self) { self.api.auth().logout(); }
}
