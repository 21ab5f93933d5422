//! Durable key-value storage for client-side state.
//!
//! Shaped after browser `localStorage`: string keys, string (JSON) values,
//! synchronous access, no locking between independent writers.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Key under which the cart is persisted.
pub const CART_KEY: &str = "cart";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("stored value is corrupt: {0}")]
    Corrupt(String),
}

/// A string-to-string durable store.
pub trait KeyValueStore {
    /// Raw value for `key`, or `None` if it was never written.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value for `key` as a whole.
    fn save(&self, key: &str, raw: &str) -> Result<(), StorageError>;
}

impl<T> KeyValueStore for &T
where
    T: KeyValueStore + ?Sized,
{
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, raw: &str) -> Result<(), StorageError> {
        (**self).save(key, raw)
    }
}

impl<T> KeyValueStore for Arc<T>
where
    T: KeyValueStore + ?Sized,
{
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, raw: &str) -> Result<(), StorageError> {
        (**self).save(key, raw)
    }
}

/// In-process store. Clones share the same map, like two tabs of one origin.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a raw value directly, bypassing any typed layer (used to seed or corrupt state).
    pub fn put_raw(&self, key: &str, raw: impl Into<String>) -> Result<(), StorageError> {
        self.save(key, &raw.into())
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))?;
        Ok(map.get(key).cloned())
    }

    fn save(&self, key: &str, raw: &str) -> Result<(), StorageError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))?;
        map.insert(key.to_string(), raw.to_string());
        Ok(())
    }
}

/// One JSON file per key under a directory.
///
/// Writes land in a uniquely named temporary sibling and are renamed into
/// place, so readers see either the old or the new value, never a partial one.
/// Concurrent writers each get their own temporary file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `{data_dir}/storefront`, falling back to `~/.local/share/storefront`.
    pub fn default_location() -> Result<Self, StorageError> {
        let base = dirs::data_dir()
            .or_else(|| {
                dirs::home_dir().map(|mut home| {
                    home.push(".local");
                    home.push("share");
                    home
                })
            })
            .ok_or_else(|| {
                StorageError::Unavailable(
                    "failed to resolve OS data directory - tried data_dir() and home_dir()/.local/share"
                        .into(),
                )
            })?;
        Ok(Self::new(base.join("storefront")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::Unavailable(format!("invalid storage key {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                Err(StorageError::Corrupt(format!("{path:?} is not valid UTF-8")))
            }
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn save(&self, key: &str, raw: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let io_err = |source: io::Error| StorageError::Io {
            path: path.clone(),
            source,
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{key}."))
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(io_err)?;
        tmp.write_all(raw.as_bytes()).map_err(io_err)?;
        tmp.persist(&path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}
