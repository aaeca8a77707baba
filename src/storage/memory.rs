use std::collections::HashMap;

use anyhow::Result;
use serde_json::Value;

use super::KeyValueStore;

/// Volatile store used for tests and dry runs
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

impl KeyValueStore for MemoryStore {
    fn load_value(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save_value(&mut self, key: &str, value: &Value) -> Result<()> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
