//! Display preferences kept next to the other durable client state.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::storage::{DurableStorage, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self { Theme::Dark => "dark", Theme::Light => "light" }
    }

    pub fn toggled(&self) -> Theme {
        match self { Theme::Dark => Theme::Light, Theme::Light => Theme::Dark }
    }

    /// Stored theme; missing or unknown values give the default.
    pub fn load(storage: &dyn DurableStorage) -> Theme {
        match storage.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_default(),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!(target: "unisearch::prefs", "failed to read theme: {}", e);
                Theme::default()
            }
        }
    }

    pub fn persist(&self, storage: &dyn DurableStorage) {
        if let Err(e) = storage.set(THEME_KEY, self.as_str()) {
            warn!(target: "unisearch::prefs", "failed to persist theme: {}", e);
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Theme {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // tolerate a JSON-quoted value
        match s.trim().trim_matches('"').to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme '{}', expected dark|light", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn load_toggle_persist() {
        let s = MemoryStorage::new();
        assert_eq!(Theme::load(&s), Theme::Dark);
        Theme::load(&s).toggled().persist(&s);
        assert_eq!(s.get(THEME_KEY).unwrap().as_deref(), Some("light"));
        assert_eq!(Theme::load(&s), Theme::Light);

        s.set(THEME_KEY, "\"dark\"").unwrap();
        assert_eq!(Theme::load(&s), Theme::Dark);
        s.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(Theme::load(&s), Theme::Dark);
    }
}
