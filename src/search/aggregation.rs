//! Flattening of `merged_by_type` into one display sequence.
//!
//! Each link is tagged with the priority class of its cloud type and a parsed
//! timestamp, then the whole sequence is stably sorted by priority ascending and
//! timestamp descending. Pagination only ever takes a prefix of this order.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::types::{CloudType, RawLink, SearchResponse};

/// Hot drives shown first.
pub const PRIORITY_HOT: u8 = 1;
pub const PRIORITY_NORMAL: u8 = 2;
/// Peer-to-peer links (magnet/ed2k) shown last.
pub const PRIORITY_SEED: u8 = 3;

pub fn priority_of(cloud_type: CloudType) -> u8 {
    match cloud_type {
        CloudType::Quark | CloudType::Baidu | CloudType::Aliyun | CloudType::Tianyi => PRIORITY_HOT,
        CloudType::Magnet | CloudType::Ed2k => PRIORITY_SEED,
        _ => PRIORITY_NORMAL,
    }
}

/// Epoch millis for a link datetime; 0 when absent or unparseable.
pub fn parse_timestamp_ms(raw: Option<&str>) -> i64 {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else { return 0 };
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.timestamp_millis();
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(n) = NaiveDateTime::parse_from_str(s, fmt) {
            return n.and_utc().timestamp_millis();
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(n) = d.and_hms_opt(0, 0, 0) {
            return n.and_utc().timestamp_millis();
        }
    }
    0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortedResultItem {
    pub link: RawLink,
    pub cloud_type: CloudType,
    pub priority: u8,
    pub timestamp: i64,
}

/// Flatten and order every link of the response. Pure; empty input gives an empty vec.
pub fn sort_merged(response: &SearchResponse) -> Vec<SortedResultItem> {
    let mut items: Vec<SortedResultItem> = Vec::with_capacity(response.flattened_count());
    for (cloud_type, links) in response.merged_by_type.groups() {
        let priority = priority_of(*cloud_type);
        for link in links {
            items.push(SortedResultItem {
                link: link.clone(),
                cloud_type: *cloud_type,
                priority,
                timestamp: parse_timestamp_ms(link.datetime.as_deref()),
            });
        }
    }
    // sort_by is stable: equal (priority, timestamp) keep flatten order
    items.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| b.timestamp.cmp(&a.timestamp)));
    items
}

/// Prefix of the sorted sequence visible under the current window.
pub fn visible_prefix(items: &[SortedResultItem], displayed_count: usize) -> &[SortedResultItem] {
    &items[..displayed_count.min(items.len())]
}

/// Per cloud type link counts, in display order (priority, then first appearance).
pub fn group_counts(response: &SearchResponse) -> Vec<(CloudType, usize)> {
    let mut out: Vec<(CloudType, usize)> = response
        .merged_by_type
        .groups()
        .iter()
        .filter(|(_, l)| !l.is_empty())
        .map(|(t, l)| (*t, l.len()))
        .collect();
    out.sort_by_key(|(t, _)| priority_of(*t));
    out
}

/// Sorted view memoized on the identity of the stored response `Arc`.
#[derive(Default)]
pub struct ResultsView {
    source: Option<Arc<SearchResponse>>,
    items: Vec<SortedResultItem>,
    recomputed: u64,
}

impl ResultsView {
    pub fn new() -> Self { Self::default() }

    /// Sorted items for `response`, recomputed only when a different response is passed.
    pub fn items(&mut self, response: Option<&Arc<SearchResponse>>) -> &[SortedResultItem] {
        match response {
            None => {
                self.source = None;
                self.items.clear();
            }
            Some(r) => {
                let same = self.source.as_ref().map(|s| Arc::ptr_eq(s, r)).unwrap_or(false);
                if !same {
                    self.items = sort_merged(r);
                    self.source = Some(r.clone());
                    self.recomputed += 1;
                }
            }
        }
        &self.items
    }

    /// How many times the sort actually ran.
    pub fn recompute_count(&self) -> u64 { self.recomputed }
}
