use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::DurableStorage;
use crate::error::AppResult;

/// One `<key>.json` file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Opens (and creates if missing) the storage directory.
    pub fn open<P: AsRef<Path>>(dir: P) -> AppResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // keep file names portable: anything outside [A-Za-z0-9_-] becomes '_'
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl DurableStorage for FileStorage {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let p = self.path_for(key);
        match fs::read_to_string(&p) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let p = self.path_for(key);
        // write-then-rename so a crash never leaves a half-written value
        let tmp = p.with_extension("json.tmp");
        fs::write(&tmp, value.as_bytes())?;
        fs::rename(&tmp, &p)?;
        debug!(target: "unisearch::storage", "stored key={} bytes={}", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let p = self.path_for(key);
        match fs::remove_file(&p) {
            Ok(()) => {
                debug!(target: "unisearch::storage", "removed key={}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
