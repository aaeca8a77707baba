use std::path::PathBuf;

use crate::domain::stats::{SortColumn, SortOrder};

pub const STORAGE_ENV: &str = "GLICKO_STORAGE";
pub const STORAGE_PATH_ENV: &str = "GLICKO_STORAGE_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Json,
    Sqlite,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" | "file" => Some(StorageBackend::Json),
            "sqlite" | "db" => Some(StorageBackend::Sqlite),
            _ => None,
        }
    }

    fn default_path(&self) -> PathBuf {
        match self {
            StorageBackend::Json => PathBuf::from("glicko_data"),
            StorageBackend::Sqlite => PathBuf::from("glicko_ledger.db"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self::with_backend(StorageBackend::Json)
    }
}

impl StorageSettings {
    pub fn with_backend(backend: StorageBackend) -> Self {
        Self {
            backend,
            path: backend.default_path(),
        }
    }

    /// Reads `GLICKO_STORAGE` and `GLICKO_STORAGE_PATH`, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var(STORAGE_ENV).ok().as_deref(),
            std::env::var(STORAGE_PATH_ENV).ok().as_deref(),
        )
    }

    fn from_values(backend: Option<&str>, path: Option<&str>) -> Self {
        let backend = match backend {
            Some(raw) => StorageBackend::parse(raw).unwrap_or_else(|| {
                log::warn!("Unknown storage backend {:?}, using json", raw);
                StorageBackend::Json
            }),
            None => StorageBackend::Json,
        };

        let mut settings = Self::with_backend(backend);
        if let Some(path) = path.filter(|p| !p.trim().is_empty()) {
            settings.path = PathBuf::from(path);
        }
        settings
    }
}

#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub default_sort: SortColumn,
    pub default_order: SortOrder,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            default_sort: SortColumn::Rating,
            default_order: SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageSettings,
    pub display: DisplaySettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            storage: StorageSettings::from_env(),
            display: DisplaySettings::default(),
        }
    }
}
