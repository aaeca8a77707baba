pub mod settings;

pub use settings::{AppConfig, DisplaySettings, StorageBackend, StorageSettings};
