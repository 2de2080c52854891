mod config;
pub mod database;
mod memory;
pub mod record;

pub use config::{Config, NotificationsConfig, StorageConfig};
pub use database::Database;
pub use memory::MemoryStore;
pub use record::{TimerRecord, DEFAULT_RECORD_KEY};

use std::path::PathBuf;

use crate::error::StorageError;

/// Durable string key-value storage.
///
/// The timer keeps exactly one entry here. Last write wins; reads reflect
/// the most recent write made by this process.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Returns the data directory, creating it if needed.
///
/// `WARDEN_DATA_DIR` wins when set. Otherwise `~/.config/warden`, or
/// `~/.config/warden-dev` when `WARDEN_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("WARDEN_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("WARDEN_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("warden-dev")
            } else {
                base_dir.join("warden")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
