//! Unified client error model.
//! `ApiError` is the single normalized shape every HTTP failure is folded into
//! (numeric code + human readable message). `AppError` is the crate-wide enum
//! returned by stores and services, with helpers mirroring the server-side kinds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code used when no HTTP response was received at all.
pub const NETWORK_ERROR_CODE: i32 = -1;
/// Code used when a response arrived but could not be encoded or decoded locally.
pub const CLIENT_ERROR_CODE: i32 = -2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message} ({code})")]
pub struct ApiError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new<S: Into<String>>(code: i32, message: S) -> Self { Self { code, message: message.into(), data: None } }

    pub fn with_data(mut self, data: Option<serde_json::Value>) -> Self { self.data = data; self }

    pub fn network() -> Self { Self::new(NETWORK_ERROR_CODE, "network connection failed, check your network settings") }

    pub fn client<S: Into<String>>(message: S) -> Self { Self::new(CLIENT_ERROR_CODE, message) }

    pub fn is_network(&self) -> bool { self.code == NETWORK_ERROR_CODE }

    pub fn is_unauthorized(&self) -> bool { self.code == 401 }
}

#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    #[error("{code}: {message}")]
    Validation { code: String, message: String },
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{code}: {message}")]
    Auth { code: String, message: String },
    #[error("{code}: {message}")]
    Storage { code: String, message: String },
    #[error("{code}: {message}")]
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Api(e) if e.is_network() => "network",
            AppError::Api(_) => "api",
            AppError::Validation { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Storage { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Api(e) => e.message.as_str(),
            AppError::Validation { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Storage { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn validation<S: Into<String>>(code: S, msg: S) -> Self { AppError::Validation { code: code.into(), message: msg.into() } }
    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }

    /// Numeric code in the same space as HTTP statuses; -1 for transport failures.
    pub fn status_code(&self) -> i32 {
        match self {
            AppError::Api(e) => e.code,
            AppError::Validation { .. } => 400,
            AppError::Auth { .. } => 401,
            AppError::Storage { .. } => 507,
            AppError::Internal { .. } => 500,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        match self {
            AppError::Api(e) => e.is_unauthorized(),
            AppError::Auth { .. } => true,
            _ => false,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self { AppError::Storage { code: "io_error".into(), message: err.to_string() } }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self { AppError::Storage { code: "serde_error".into(), message: err.to_string() } }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: treat as Internal unless downcasted elsewhere
        AppError::Internal { code: "internal".into(), message: err.to_string() }
    }
}
