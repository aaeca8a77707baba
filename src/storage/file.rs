use anyhow::{Context, Result};
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::KeyValueStore;

/// One pretty-printed JSON file per key inside a directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn build_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn write_temp(&self, key: &str, value: &Value) -> Result<(PathBuf, PathBuf)> {
        let path = self.build_path(key);
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(value)?;
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write storage file {}", tmp.display()))?;
        Ok((tmp, path))
    }
}

impl KeyValueStore for JsonFileStore {
    fn load_value(&self, key: &str) -> Result<Option<Value>> {
        let path = self.build_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value = serde_json::from_str(&json).with_context(|| {
            format!(
                "Failed to parse JSON from {:?}. First 200 chars: {}",
                path,
                json.chars().take(200).collect::<String>()
            )
        })?;
        Ok(Some(value))
    }

    fn save_value(&mut self, key: &str, value: &Value) -> Result<()> {
        // write next to the target, then rename over it
        let (tmp, path) = self.write_temp(key, value)?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!("Saved {} to {}", key, path.display());
        Ok(())
    }

    /// Every temp file is written before any target is replaced
    fn commit(&mut self, entries: &[(&str, Value)]) -> Result<()> {
        let mut staged = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match self.write_temp(key, value) {
                Ok(paths) => staged.push(paths),
                Err(e) => {
                    for (tmp, _) in &staged {
                        let _ = fs::remove_file(tmp);
                    }
                    return Err(e);
                }
            }
        }

        for (tmp, path) in &staged {
            fs::rename(tmp, path)
                .with_context(|| format!("Failed to replace {}", path.display()))?;
        }
        debug!("Committed {} keys to {}", entries.len(), self.dir.display());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.build_path(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        value: String,
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path()).unwrap();

        let data = TestData {
            value: "test".to_string(),
        };

        store.save("test_key", &data).unwrap();
        let loaded: Option<TestData> = store.load("test_key").unwrap();

        assert_eq!(loaded, Some(data));
        assert!(dir.path().join("test_key.json").exists());
    }

    #[test]
    fn missing_key_is_none_and_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("nested")).unwrap();

        assert!(store.load_value("absent").unwrap().is_none());
        store.remove("absent").unwrap();

        store.save_value("k", &serde_json::json!([1, 2])).unwrap();
        store.remove("k").unwrap();
        assert!(store.load_value("k").unwrap().is_none());
    }

    #[test]
    fn commit_replaces_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path()).unwrap();

        store.save_value("a", &serde_json::json!("old")).unwrap();
        store
            .commit(&[("a", serde_json::json!("new")), ("b", serde_json::json!([1]))])
            .unwrap();

        assert_eq!(store.load_value("a").unwrap(), Some(serde_json::json!("new")));
        assert_eq!(store.load_value("b").unwrap(), Some(serde_json::json!([1])));
        assert!(!dir.path().join("a.json.tmp").exists());
    }

    #[test]
    fn failed_commit_leaves_previous_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path()).unwrap();
        store.save_value("a", &serde_json::json!("old")).unwrap();

        // a directory in the way makes the second temp file unwritable
        fs::create_dir(dir.path().join("b.json.tmp")).unwrap();

        let result = store.commit(&[("a", serde_json::json!("new")), ("b", serde_json::json!([1]))]);
        assert!(result.is_err());
        assert_eq!(store.load_value("a").unwrap(), Some(serde_json::json!("old")));
        assert!(store.load_value("b").unwrap().is_none());
        assert!(!dir.path().join("a.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_reports_context() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();

        let err = store.load_value("broken").unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
