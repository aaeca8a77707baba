pub mod file;
pub mod memory;
pub mod sqlite;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::settings::{StorageBackend, StorageSettings};

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub const PLAYERS_KEY: &str = "glickoPlayers";
pub const GAMES_KEY: &str = "glickoGames";
pub const SEASON_STATS_KEY: &str = "glickoSeasonStats";

/// Named JSON snapshots, each overwritten as a whole
pub trait KeyValueStore {
    fn load_value(&self, key: &str) -> Result<Option<Value>>;

    fn save_value(&mut self, key: &str, value: &Value) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;

    /// Writes several keys together; stores that can do so atomically override this
    fn commit(&mut self, entries: &[(&str, Value)]) -> Result<()> {
        for (key, value) in entries {
            self.save_value(key, value)?;
        }
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>
    where
        Self: Sized,
    {
        match self.load_value(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .with_context(|| format!("Failed to parse stored {}", key)),
            None => Ok(None),
        }
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T>
    where
        Self: Sized,
    {
        Ok(self.load(key)?.unwrap_or_default())
    }

    fn save<T: Serialize>(&mut self, key: &str, data: &T) -> Result<()>
    where
        Self: Sized,
    {
        let value = serde_json::to_value(data)
            .with_context(|| format!("Failed to serialize {}", key))?;
        self.save_value(key, &value)
    }
}

impl KeyValueStore for Box<dyn KeyValueStore> {
    fn load_value(&self, key: &str) -> Result<Option<Value>> {
        (**self).load_value(key)
    }

    fn save_value(&mut self, key: &str, value: &Value) -> Result<()> {
        (**self).save_value(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn commit(&mut self, entries: &[(&str, Value)]) -> Result<()> {
        (**self).commit(entries)
    }
}

/// Opens the store selected in the settings
pub fn open_store(settings: &StorageSettings) -> Result<Box<dyn KeyValueStore>> {
    log::debug!("Opening {:?} storage at {}", settings.backend, settings.path.display());
    match settings.backend {
        StorageBackend::Json => Ok(Box::new(JsonFileStore::new(&settings.path)?)),
        StorageBackend::Sqlite => Ok(Box::new(SqliteStore::open(&settings.path)?)),
    }
}
