//! Key-value string storage, the device-local persistence boundary.
//!
//! Everything the app keeps between runs goes through a [`Storage`]: the
//! serialized progress map under [`PROGRESS_KEY`] and one entry per display
//! setting. [`FileStorage`] keeps all entries in a single JSON object on disk;
//! [`MemoryStorage`] is the in-process variant used by tests and dry runs.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

pub const PROGRESS_KEY: &str = "cr_progress";
pub const THEME_KEY: &str = "cr_theme";
pub const ENGLISH_FIRST_KEY: &str = "cr_en_first";
pub const HINTS_KEY: &str = "cr_hints";

/// Synchronous string store. `set` must be durable when it returns.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// All entries in one JSON file, rewritten atomically on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Opens (or starts) the store at `path`. A missing file starts empty;
    /// an unparsable one is moved aside to `*.json.corrupt` and also starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|source| StorageError::Io {
                operation: "read",
                path: path.clone(),
                source,
            })?;
            match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    let aside = path.with_extension("json.corrupt");
                    tracing::warn!(
                        "storage file {} is corrupt ({err}), starting empty; original kept at {}",
                        path.display(),
                        aside.display()
                    );
                    let _ = fs::rename(&path, &aside);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| StorageError::Io {
                operation: "create directory for",
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let body = serde_json::to_string_pretty(&self.entries).map_err(StorageError::Encode)?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut file = File::create(&temp_path).map_err(io_err("create", &temp_path))?;
        file.write_all(body.as_bytes())
            .map_err(io_err("write", &temp_path))?;
        file.sync_all().map_err(io_err("sync", &temp_path))?;
        fs::rename(&temp_path, &self.path).map_err(io_err("replace", &self.path))?;
        Ok(())
    }
}

fn io_err(operation: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> StorageError {
    let path = path.to_path_buf();
    move |source| StorageError::Io {
        operation,
        path,
        source,
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// In-memory storage whose writes fail while `broken` is set.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FlakyStorage {
    pub inner: MemoryStorage,
    pub broken: bool,
}

#[cfg(test)]
impl Storage for FlakyStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.broken {
            return Err(StorageError::Io {
                operation: "write",
                path: PathBuf::from("state.json"),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = FileStorage::open(&path).unwrap();
        store.set(THEME_KEY, "light").unwrap();
        store.set(HINTS_KEY, "0").unwrap();
        store.remove(HINTS_KEY).unwrap();

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(THEME_KEY).as_deref(), Some("light"));
        assert_eq!(reopened.get(HINTS_KEY), None);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileStorage::open(&path).unwrap();
        assert_eq!(store.get(PROGRESS_KEY), None);
        assert!(path.with_extension("json.corrupt").exists());
    }

    #[test]
    fn memory_storage_roundtrip() {
        let mut store = MemoryStorage::new().with_entry(ENGLISH_FIRST_KEY, "1");
        assert_eq!(store.get(ENGLISH_FIRST_KEY).as_deref(), Some("1"));
        store.remove(ENGLISH_FIRST_KEY).unwrap();
        assert_eq!(store.get(ENGLISH_FIRST_KEY), None);
    }
}
