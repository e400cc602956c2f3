//! Administrator API-key management.

mod service;
mod types;

pub use service::{AdminService, MAX_BATCH_CREATE};
pub use types::{
    batch_summary, format_key_display, key_stats, remaining_time, ApiKeyInfo, BatchCreateResult, BatchOperationResult, KeyStats, KeyStatus,
    RemainingTime,
};
