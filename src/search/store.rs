//! Search state container.
//!
//! One `SearchStore` owns the parameters, the raw response, the error text,
//! history, the option lists from `/health` and the pagination window. Every
//! transition happens under a short `parking_lot::Mutex` section (never across
//! an await) and is followed by a snapshot broadcast to subscribers.
//!
//! Each search takes the next request token. A completion whose token is no
//! longer the latest is dropped, so a slow response can never overwrite the
//! results of a newer search. `clear_results` and `reset` also advance the
//! token, which orphans whatever is still in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::aggregation::{visible_prefix, ResultsView, SortedResultItem};
use super::backend::SearchBackend;
use super::history::SearchHistory;
use super::pagination::PaginationWindow;
use super::types::{ParamsPatch, SearchParameters, SearchResponse};
use super::validate::validate_search_params;
use super::wire::SearchRequest;
use crate::observe::{Observers, SubscriptionId};
use crate::storage::SharedStorage;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchState {
    pub params: SearchParameters,
    pub loading: bool,
    pub results: Option<Arc<SearchResponse>>,
    pub error: Option<String>,
    pub history: SearchHistory,
    pub available_channels: Vec<String>,
    pub available_plugins: Vec<String>,
    pub pagination: PaginationWindow,
}

impl SearchState {
    /// Flattened link count of the stored response.
    pub fn total_count(&self) -> usize { self.results.as_ref().map(|r| r.flattened_count()).unwrap_or(0) }
}

/// How a `search` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Response stored; carries the flattened total.
    Completed { total: usize },
    /// Parameters failed validation; nothing was sent.
    Rejected,
    /// The backend call failed; the message is in `error`.
    Failed,
    /// A newer search (or clear/reset) started before this one finished.
    Superseded,
}

pub struct SearchStore<B: SearchBackend> {
    backend: B,
    storage: SharedStorage,
    state: Mutex<SearchState>,
    view: Mutex<ResultsView>,
    latest_request: AtomicU64,
    observers: Observers<SearchState>,
}

impl<B: SearchBackend> SearchStore<B> {
    /// Default parameters plus the persisted history.
    pub fn new(backend: B, storage: SharedStorage) -> Self {
        let history = SearchHistory::load(storage.as_ref());
        Self::with_state(backend, storage, SearchState { history, ..Default::default() })
    }

    pub fn with_state(backend: B, storage: SharedStorage, state: SearchState) -> Self {
        Self {
            backend,
            storage,
            state: Mutex::new(state),
            view: Mutex::new(ResultsView::new()),
            latest_request: AtomicU64::new(0),
            observers: Observers::new(),
        }
    }

    pub fn subscribe<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&SearchState) + Send + Sync + 'static,
    {
        self.observers.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool { self.observers.unsubscribe(id) }

    fn update<R>(&self, f: impl FnOnce(&mut SearchState) -> R) -> R {
        let (out, snapshot) = {
            let mut s = self.state.lock();
            let out = f(&mut s);
            (out, s.clone())
        };
        self.observers.notify(&snapshot);
        out
    }

    /// Like `update`, but only when `token` is still the latest request.
    fn update_if_current<R>(&self, token: u64, f: impl FnOnce(&mut SearchState) -> R) -> Option<R> {
        let (out, snapshot) = {
            let mut s = self.state.lock();
            if self.latest_request.load(Ordering::SeqCst) != token {
                return None;
            }
            let out = f(&mut s);
            (out, s.clone())
        };
        self.observers.notify(&snapshot);
        Some(out)
    }

    fn invalidate_in_flight(&self) { self.latest_request.fetch_add(1, Ordering::SeqCst); }

    /// Shallow merge into the current parameters. No validation.
    pub fn set_parameters(&self, patch: &ParamsPatch) {
        self.update(|s| s.params = s.params.merged(patch));
    }

    pub async fn search(&self, patch: Option<ParamsPatch>) -> SearchOutcome {
        let candidate = {
            let s = self.state.lock();
            match &patch { Some(p) => s.params.merged(p), None => s.params.clone() }
        };
        if let Err(e) = validate_search_params(&candidate) {
            debug!(target: "unisearch::search", "rejected search: {}", e);
            self.update(|s| s.error = Some(e.message().to_string()));
            return SearchOutcome::Rejected;
        }

        let request = SearchRequest::from(&candidate);
        let token = self.update(|s| {
            s.params = candidate;
            s.results = None;
            s.error = None;
            s.loading = true;
            s.pagination = PaginationWindow::default();
            // bumped under the state lock so completions can compare atomically
            self.latest_request.fetch_add(1, Ordering::SeqCst) + 1
        });
        info!(target: "unisearch::search", "search #{} kw={:?} src={} res={}", token, request.kw, request.src.as_str(), request.res.as_str());

        let outcome = self.backend.search(&request).await;

        let applied = match outcome {
            Ok(resp) => {
                let total = resp.flattened_count();
                let resp = Arc::new(resp);
                self.update_if_current(token, |s| {
                    s.results = Some(resp);
                    s.loading = false;
                    s.pagination = PaginationWindow::first_page(total);
                    if s.history.add(&request.kw) {
                        s.history.persist(self.storage.as_ref());
                    }
                    SearchOutcome::Completed { total }
                })
            }
            Err(e) => {
                let applied = self.update_if_current(token, |s| {
                    s.error = Some(e.message.clone());
                    s.results = None;
                    s.loading = false;
                    SearchOutcome::Failed
                });
                if applied.is_some() {
                    warn!(target: "unisearch::search", "search #{} failed: {}", token, e);
                }
                applied
            }
        };
        applied.unwrap_or_else(|| {
            debug!(target: "unisearch::search", "discarding stale completion of search #{}", token);
            SearchOutcome::Superseded
        })
    }

    /// Clears results, error, pagination and the keyword.
    pub fn clear_results(&self) {
        self.update(|s| {
            self.invalidate_in_flight();
            s.results = None;
            s.error = None;
            s.loading = false;
            s.pagination = PaginationWindow::default();
            s.params.keyword.clear();
        });
    }

    /// Shows one more page. Returns false when there was nothing more.
    pub fn load_more(&self) -> bool {
        let snapshot = {
            let mut s = self.state.lock();
            let total = s.total_count();
            if s.results.is_none() || !s.pagination.advance(total) {
                return false;
            }
            s.clone()
        };
        self.observers.notify(&snapshot);
        true
    }

    pub fn add_to_history(&self, keyword: &str) {
        self.update(|s| {
            if s.history.add(keyword) {
                s.history.persist(self.storage.as_ref());
            }
        });
    }

    pub fn remove_from_history(&self, keyword: &str) -> bool {
        self.update(|s| {
            let removed = s.history.remove(keyword);
            if removed {
                s.history.persist(self.storage.as_ref());
            }
            removed
        })
    }

    pub fn clear_history(&self) {
        self.update(|s| {
            s.history.clear();
            s.history.persist(self.storage.as_ref());
        });
    }

    /// Refreshes channel and plugin lists from `/health`; on failure the
    /// previous lists stay.
    pub async fn load_available_options(&self) -> bool {
        match self.backend.health().await {
            Ok(health) => {
                let plugins = health.plugins.names().to_vec();
                debug!(target: "unisearch::search", "options: {} channels, {} plugins", health.channels.len(), plugins.len());
                self.update(|s| {
                    s.available_channels = health.channels;
                    s.available_plugins = plugins;
                });
                true
            }
            Err(e) => {
                warn!(target: "unisearch::search", "failed to load search options: {}", e);
                false
            }
        }
    }

    /// Back to default parameters; history and option lists survive.
    pub fn reset(&self) {
        self.update(|s| {
            self.invalidate_in_flight();
            s.params = SearchParameters::default();
            s.results = None;
            s.error = None;
            s.loading = false;
            s.pagination = PaginationWindow::default();
        });
    }

    pub fn set_error(&self, message: Option<String>) {
        self.update(|s| s.error = message);
    }

    pub fn snapshot(&self) -> SearchState { self.state.lock().clone() }

    pub fn total_count(&self) -> usize { self.state.lock().total_count() }

    pub fn history(&self) -> Vec<String> { self.state.lock().history.entries().to_vec() }

    /// Full sorted sequence for the stored response.
    pub fn sorted_results(&self) -> Vec<SortedResultItem> {
        let results = self.state.lock().results.clone();
        self.view.lock().items(results.as_ref()).to_vec()
    }

    /// Visible prefix of the sorted sequence.
    pub fn displayed_results(&self) -> Vec<SortedResultItem> {
        let (results, window) = {
            let s = self.state.lock();
            (s.results.clone(), s.pagination)
        };
        let mut view = self.view.lock();
        visible_prefix(view.items(results.as_ref()), window.displayed_count).to_vec()
    }

    /// How often the sorted view was rebuilt.
    pub fn sort_recompute_count(&self) -> u64 { self.view.lock().recompute_count() }
}
