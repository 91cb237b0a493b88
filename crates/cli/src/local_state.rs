use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use engine::{EngineError, LocalCache};

use crate::error::Result;

/// Local cache persisted as one JSON object, rewritten on every `set`.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileCache {
    /// Open the cache at `path`; a missing file is an empty cache.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(&self.entries)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, record: String) -> std::result::Result<(), EngineError> {
        self.entries.insert(key.to_string(), record);
        self.save().map_err(|err| {
            EngineError::Storage(format!("writing {}: {err}", self.path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path().join("cache.json")).unwrap();
        assert_eq!(cache.get("users/alice/account"), None);
    }

    #[test]
    fn entries_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let mut cache = FileCache::open(&path).unwrap();
        cache
            .set("users/alice/ledger", "{\"total\":0}".to_string())
            .unwrap();
        assert!(path.exists());

        let reopened = FileCache::open(&path).unwrap();
        assert_eq!(
            reopened.get("users/alice/ledger").as_deref(),
            Some("{\"total\":0}")
        );
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(FileCache::open(&path).is_err());
    }
}
