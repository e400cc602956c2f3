//! Recent-keyword list: at most ten entries, newest first, no duplicates.

use tracing::warn;

use crate::storage::{read_json, write_json, DurableStorage, SEARCH_HISTORY_KEY};

pub const MAX_HISTORY: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    pub fn new() -> Self { Self::default() }

    /// Builds a history from arbitrary entries, re-applying the invariants.
    pub fn from_entries<I: IntoIterator<Item = String>>(entries: I) -> Self {
        let mut out: Vec<String> = Vec::new();
        for e in entries {
            let e = e.trim().to_string();
            if e.is_empty() || out.contains(&e) { continue; }
            out.push(e);
            if out.len() == MAX_HISTORY { break; }
        }
        Self { entries: out }
    }

    /// Reads the persisted list; missing or malformed data yields an empty history.
    pub fn load(storage: &dyn DurableStorage) -> Self {
        match read_json::<Vec<String>>(storage, SEARCH_HISTORY_KEY) {
            Ok(Some(list)) => Self::from_entries(list),
            Ok(None) => Self::new(),
            Err(e) => {
                warn!(target: "unisearch::history", "discarding unreadable search history: {}", e);
                Self::new()
            }
        }
    }

    pub fn entries(&self) -> &[String] { &self.entries }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Moves (or inserts) `keyword` to the front and trims to capacity.
    /// Returns false when the keyword is blank and nothing changed.
    pub fn add(&mut self, keyword: &str) -> bool {
        let kw = keyword.trim();
        if kw.is_empty() { return false; }
        self.entries.retain(|e| e != kw);
        self.entries.insert(0, kw.to_string());
        self.entries.truncate(MAX_HISTORY);
        true
    }

    pub fn remove(&mut self, keyword: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e != keyword);
        self.entries.len() != before
    }

    pub fn clear(&mut self) { self.entries.clear(); }

    /// Writes the list, or deletes the key when the list is empty.
    pub fn persist(&self, storage: &dyn DurableStorage) {
        let res = if self.entries.is_empty() {
            storage.remove(SEARCH_HISTORY_KEY)
        } else {
            write_json(storage, SEARCH_HISTORY_KEY, &self.entries)
        };
        if let Err(e) = res {
            warn!(target: "unisearch::history", "failed to persist search history: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn add_moves_existing_to_front() {
        let mut h = SearchHistory::new();
        h.add("foo");
        h.add("bar");
        h.add("foo");
        assert_eq!(h.entries(), ["foo".to_string(), "bar".to_string()]);
        assert!(!h.add("   "));
    }

    #[test]
    fn capped_at_ten_dropping_oldest() {
        let mut h = SearchHistory::new();
        for i in 0..12 { h.add(&format!("kw{}", i)); }
        assert_eq!(h.len(), MAX_HISTORY);
        assert_eq!(h.entries()[0], "kw11");
        assert_eq!(h.entries()[9], "kw2");
        assert!(!h.entries().contains(&"kw0".to_string()));
    }

    #[test]
    fn load_repairs_and_tolerates_bad_data() {
        let s = MemoryStorage::with_entries([(SEARCH_HISTORY_KEY, r#"["a"," a ","b","","c","d","e","f","g","h","i","j","k"]"#)]);
        let h = SearchHistory::load(&s);
        assert_eq!(h.len(), MAX_HISTORY);
        assert_eq!(h.entries()[0], "a");
        assert_eq!(h.entries()[1], "b");

        let s = MemoryStorage::with_entries([(SEARCH_HISTORY_KEY, "oops")]);
        assert!(SearchHistory::load(&s).is_empty());
        assert!(SearchHistory::load(&MemoryStorage::new()).is_empty());
    }

    #[test]
    fn persist_removes_key_when_empty() {
        let s = MemoryStorage::new();
        let mut h = SearchHistory::from_entries(vec!["foo".to_string(), "bar".to_string()]);
        h.remove("foo");
        h.persist(&s);
        assert_eq!(s.get(SEARCH_HISTORY_KEY).unwrap().as_deref(), Some(r#"["bar"]"#));
        h.remove("bar");
        h.persist(&s);
        assert_eq!(s.get(SEARCH_HISTORY_KEY).unwrap(), None);
    }
}
