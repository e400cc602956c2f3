//! Client configuration resolved from the environment, with CLI flags layered on top.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::{AppError, AppResult};

pub const DEFAULT_API_BASE: &str = "http://localhost:8888/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_DATA_DIR: &str = ".unisearch";

pub const ENV_API_BASE: &str = "UNISEARCH_API_BASE";
pub const ENV_TIMEOUT_MS: &str = "UNISEARCH_TIMEOUT_MS";
pub const ENV_DATA_DIR: &str = "UNISEARCH_DATA_DIR";
pub const ENV_OUTPUT: &str = "UNISEARCH_OUTPUT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Table,
    Json,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub timeout: Duration,
    pub data_dir: PathBuf,
    pub output: OutputMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output: OutputMode::Table,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup; unparsable values fall back to defaults.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut cfg = Self::default();
        if let Some(base) = lookup(ENV_API_BASE).filter(|s| !s.trim().is_empty()) {
            cfg.api_base = base.trim().to_string();
        }
        if let Some(ms) = lookup(ENV_TIMEOUT_MS).and_then(|s| s.trim().parse::<u64>().ok()) {
            if ms > 0 { cfg.timeout = Duration::from_millis(ms); }
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|s| !s.trim().is_empty()) {
            cfg.data_dir = PathBuf::from(dir);
        }
        if lookup(ENV_OUTPUT).map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false) {
            cfg.output = OutputMode::Json;
        }
        cfg
    }

    /// Parsed base URL, always ending in '/' so relative joins stay under `/api`.
    pub fn base_url(&self) -> AppResult<Url> {
        let mut raw = self.api_base.clone();
        if !raw.ends_with('/') { raw.push('/'); }
        Url::parse(&raw).map_err(|e| AppError::validation("invalid_base_url".to_string(), format!("invalid API base URL '{}': {}", self.api_base, e)))
    }
}
