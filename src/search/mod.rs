//! Search domain: parameters, wire mapping, result aggregation and the store.

pub mod aggregation;
pub mod backend;
pub mod history;
pub mod pagination;
pub mod share;
pub mod store;
pub mod types;
pub mod validate;
pub mod wire;

pub use aggregation::{group_counts, sort_merged, ResultsView, SortedResultItem};
pub use backend::SearchBackend;
pub use history::{SearchHistory, MAX_HISTORY};
pub use pagination::{PaginationWindow, PAGE_SIZE};
pub use share::{build_search_url, parse_search_url};
pub use store::{SearchOutcome, SearchState, SearchStore};
pub use types::{
    CloudType, HealthResponse, MergedByType, ParamsPatch, PluginList, RawLink, ResultKind, SearchParameters, SearchResponse,
    SearchResult, SourceKind,
};
pub use validate::validate_search_params;
pub use wire::SearchRequest;
