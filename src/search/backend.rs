use std::future::Future;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::error::ApiError;

use super::types::{HealthResponse, SearchResponse};
use super::wire::SearchRequest;

/// Network seam of the search store.
pub trait SearchBackend: Send + Sync {
    /// `POST /search` with the wire body; yields the unwrapped `data` payload.
    fn search(&self, request: &SearchRequest) -> impl Future<Output = Result<SearchResponse, ApiError>> + Send;

    /// `GET /health`.
    fn health(&self) -> impl Future<Output = Result<HealthResponse, ApiError>> + Send;
}

impl SearchBackend for ApiClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> { self.post("search", request).await }

    async fn health(&self) -> Result<HealthResponse, ApiError> { self.get("health").await }
}

impl<B: SearchBackend> SearchBackend for Arc<B> {
    fn search(&self, request: &SearchRequest) -> impl Future<Output = Result<SearchResponse, ApiError>> + Send { (**self).search(request) }

    fn health(&self) -> impl Future<Output = Result<HealthResponse, ApiError>> + Send { (**self).health() }
}
