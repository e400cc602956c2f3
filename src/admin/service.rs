use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use super::types::{
    ApiKeyInfo, BatchCreateRequest, BatchCreateResult, BatchExtendRequest, BatchKeysRequest, BatchOperationResult, CreateKeyRequest,
    KeyEnvelope, KeyList, UpdateKeyRequest,
};
use crate::api::ApiClient;
use crate::error::{AppError, AppResult};

pub const MAX_BATCH_CREATE: u32 = 100;

/// API-key management under `/admin/keys`. Requires an admin session.
#[derive(Clone)]
pub struct AdminService {
    api: ApiClient,
}

fn key_path(key: &str) -> String { format!("admin/keys/{}", urlencoding::encode(key)) }

fn check_hours(field: &str, hours: i64) -> AppResult<()> {
    if hours < 1 {
        return Err(AppError::validation(format!("{}_invalid", field), format!("{} must be at least 1 hour", field)));
    }
    Ok(())
}

fn clean_keys(keys: &[String]) -> AppResult<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(keys.len());
    for k in keys.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
        if !out.iter().any(|o| o == k) { out.push(k.to_string()); }
    }
    if out.is_empty() {
        return Err(AppError::validation("keys_empty", "select at least one API key"));
    }
    Ok(out)
}

impl AdminService {
    pub fn new(api: ApiClient) -> Self { Self { api } }

    fn require_admin(&self) -> AppResult<()> {
        if self.api.auth().is_admin() { Ok(()) } else { Err(AppError::auth("admin_required", "administrator login required")) }
    }

    pub async fn list_keys(&self) -> AppResult<Vec<ApiKeyInfo>> {
        self.require_admin()?;
        let list: KeyList = self.api.get("admin/keys").await?;
        Ok(list.keys)
    }

    pub async fn create_key(&self, ttl_hours: i64, description: &str) -> AppResult<ApiKeyInfo> {
        self.require_admin()?;
        check_hours("ttl_hours", ttl_hours)?;
        let body = CreateKeyRequest { ttl_hours, description: description.trim().to_string() };
        let created: KeyEnvelope = self.api.post("admin/keys", &body).await?;
        info!(target: "unisearch::admin", "created API key {}", created.key.display_key());
        Ok(created.key)
    }

    pub async fn delete_key(&self, key: &str) -> AppResult<()> {
        self.require_admin()?;
        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::validation("key_empty", "API key must not be empty"));
        }
        let _: Value = self.api.delete(&key_path(key)).await?;
        info!(target: "unisearch::admin", "deleted API key {}", super::types::format_key_display(key));
        Ok(())
    }

    /// Sets an absolute expiry, extends it, or both.
    pub async fn update_key(&self, key: &str, expires_at: Option<DateTime<Utc>>, extend_hours: Option<i64>) -> AppResult<ApiKeyInfo> {
        self.require_admin()?;
        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::validation("key_empty", "API key must not be empty"));
        }
        if expires_at.is_none() && extend_hours.is_none() {
            return Err(AppError::validation("update_empty", "provide a new expiry or hours to extend"));
        }
        if let Some(h) = extend_hours {
            check_hours("extend_hours", h)?;
        }
        let body = UpdateKeyRequest { expires_at, extend_hours };
        let updated: KeyEnvelope = self.api.patch(&key_path(key), &body).await?;
        Ok(updated.key)
    }

    pub async fn batch_create(&self, count: u32, ttl_hours: i64, description_prefix: Option<&str>) -> AppResult<BatchCreateResult> {
        self.require_admin()?;
        if !(1..=MAX_BATCH_CREATE).contains(&count) {
            return Err(AppError::validation("count_out_of_range", "count must be between 1 and 100"));
        }
        check_hours("ttl_hours", ttl_hours)?;
        let body = BatchCreateRequest {
            count,
            ttl_hours,
            description_prefix: description_prefix.map(str::trim).filter(|p| !p.is_empty()).map(str::to_string),
        };
        let res: BatchCreateResult = self.api.post("admin/keys/batch-create", &body).await?;
        info!(target: "unisearch::admin", "batch create: {} ok, {} failed", res.success_count, res.failed_count);
        Ok(res)
    }

    pub async fn batch_delete(&self, keys: &[String]) -> AppResult<BatchOperationResult> {
        self.require_admin()?;
        let body = BatchKeysRequest { keys: clean_keys(keys)? };
        let res: BatchOperationResult = self.api.post("admin/keys/batch-delete", &body).await?;
        info!(target: "unisearch::admin", "batch delete: {} ok, {} failed", res.success_count, res.failed_count);
        Ok(res)
    }

    pub async fn batch_extend(&self, keys: &[String], extend_hours: i64) -> AppResult<BatchOperationResult> {
        self.require_admin()?;
        let keys = clean_keys(keys)?;
        check_hours("extend_hours", extend_hours)?;
        let body = BatchExtendRequest { keys, extend_hours };
        let res: BatchOperationResult = self.api.post("admin/keys/batch-extend", &body).await?;
        info!(target: "unisearch::admin", "batch extend: {} ok, {} failed", res.success_count, res.failed_count);
        Ok(res)
    }
}
