use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ImportError, StorageError};
use crate::storage::{Storage, PROGRESS_KEY};

use super::{ProgressKey, ProgressMap, ProgressValue};

/// Progress map bound to its storage. Every mutation is written through
/// before the call returns, and the in-memory map only changes once the
/// write succeeded.
#[derive(Debug)]
pub struct ProgressStore<S: Storage> {
    map: ProgressMap,
    storage: S,
}

impl<S: Storage> ProgressStore<S> {
    /// Reads the persisted map. Corrupt data is not an error: it is logged
    /// and replaced by an empty map.
    pub fn open(storage: S) -> Self {
        let map = match storage.get(PROGRESS_KEY) {
            None => ProgressMap::new(),
            Some(raw) => ProgressMap::from_json(&raw).unwrap_or_else(|err| {
                tracing::warn!("stored progress is unreadable ({err}), starting from scratch");
                ProgressMap::new()
            }),
        };
        tracing::debug!(entries = map.len(), "progress opened");
        Self { map, storage }
    }

    pub fn map(&self) -> &ProgressMap {
        &self.map
    }

    pub fn snapshot(&self) -> ProgressMap {
        self.map.clone()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn get(&self, key: &ProgressKey) -> i64 {
        self.map.count(key)
    }

    pub fn text(&self, key: &ProgressKey) -> Option<&str> {
        self.map.text(key)
    }

    /// Applies `edit` to a copy of the map, persists the copy and only then
    /// keeps it. On a storage error the map is unchanged, so several writes
    /// made in one `update` land together or not at all.
    pub fn update<R>(
        &mut self,
        edit: impl FnOnce(&mut ProgressMap) -> R,
    ) -> Result<R, StorageError> {
        let mut next = self.map.clone();
        let out = edit(&mut next);
        self.commit(next)?;
        Ok(out)
    }

    pub fn set(&mut self, key: &ProgressKey, value: i64) -> Result<(), StorageError> {
        self.update(|map| map.insert(key, ProgressValue::Count(value)))
    }

    pub fn set_text(&mut self, key: &ProgressKey, value: &str) -> Result<(), StorageError> {
        self.update(|map| map.insert(key, ProgressValue::Text(value.to_string())))
    }

    /// Adds `delta` to the counter and returns the new value.
    pub fn increment(&mut self, key: &ProgressKey, delta: i64) -> Result<i64, StorageError> {
        self.update(|map| map.increment(key, delta))
    }

    pub fn delete(&mut self, key: &ProgressKey) -> Result<(), StorageError> {
        if !self.map.contains(key) {
            return Ok(());
        }
        self.update(|map| {
            map.remove(key);
        })
    }

    /// Swaps in `map` wholesale; nothing from the old map survives.
    pub fn replace_all(&mut self, map: ProgressMap) -> Result<(), StorageError> {
        self.commit(map)
    }

    pub fn reset(&mut self) -> Result<(), StorageError> {
        tracing::info!(entries = self.map.len(), "resetting all progress");
        self.replace_all(ProgressMap::new())
    }

    /// Replaces progress with the object in `text`. On any error the current
    /// map is left exactly as it was.
    pub fn import_json(&mut self, text: &str) -> Result<(), ImportError> {
        let map = ProgressMap::from_json(text)?;
        tracing::info!(entries = map.len(), "importing progress");
        self.replace_all(map)?;
        Ok(())
    }

    pub fn export_json(&self) -> Result<String, StorageError> {
        self.map.to_json_pretty().map_err(StorageError::Encode)
    }

    /// Writes the pretty export to `path`.
    pub fn export_to(&self, path: &Path) -> Result<(), StorageError> {
        let body = self.export_json()?;
        fs::write(path, body).map_err(|source| StorageError::Io {
            operation: "write",
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), entries = self.map.len(), "progress exported");
        Ok(())
    }

    pub fn import_from(&mut self, path: &Path) -> Result<(), ImportError> {
        let text = fs::read_to_string(path).map_err(|source| ImportError::Read {
            path: PathBuf::from(path),
            source,
        })?;
        self.import_json(&text)
    }

    fn commit(&mut self, next: ProgressMap) -> Result<(), StorageError> {
        let body = next.to_json().map_err(StorageError::Encode)?;
        if let Err(err) = self.storage.set(PROGRESS_KEY, &body) {
            tracing::warn!("progress not saved, keeping previous state: {err}");
            return Err(err);
        }
        self.map = next;
        Ok(())
    }
}
