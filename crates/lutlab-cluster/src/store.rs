//! Keyed record storage.
//!
//! [`Store`] is the persistence seam used by the snapshot store. Two
//! backends ship with the crate:
//!
//! - [`MemoryStore`] - `RwLock`-guarded map, for tests and one-shot runs
//! - [`JsonDirStore`] - one pretty-printed JSON file per key
//!
//! `put_new` never replaces an existing key; for [`JsonDirStore`] this is
//! enforced by the filesystem (temp file persisted without clobbering),
//! so concurrent writers of the same key cannot both succeed.

use crate::{ClusterError, ClusterResult};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A record that can be stored under a string key.
pub trait Keyed {
    /// Storage key. Must be non-empty and consist of ASCII alphanumerics,
    /// `-` or `_`.
    fn key(&self) -> String;
}

/// Storage abstraction for keyed records.
///
/// Object-safe: usable as `dyn Store<T>`. Implementors must be
/// `Send + Sync`.
pub trait Store<T>: Send + Sync {
    /// Stores a record whose key must not exist yet.
    ///
    /// # Errors
    /// - `ClusterError::Storage` if the key is already taken
    fn put_new(&self, item: &T) -> ClusterResult<()>;

    /// Stores a record, replacing any previous one with the same key.
    fn put(&self, item: &T) -> ClusterResult<()>;

    /// Fetches a record by key.
    fn get(&self, key: &str) -> ClusterResult<Option<T>>;

    /// Returns every record accepted by `filter`, in key order.
    fn list(&self, filter: &dyn Fn(&T) -> bool) -> ClusterResult<Vec<T>>;
}

fn check_key(key: &str) -> ClusterResult<()> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ClusterError::InvalidArgument(format!("invalid storage key: {key:?}")))
    }
}

/// In-memory store.
#[derive(Debug)]
pub struct MemoryStore<T> {
    items: RwLock<BTreeMap<String, T>>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<T> MemoryStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl<T: Keyed + Clone + Send + Sync> Store<T> for MemoryStore<T> {
    fn put_new(&self, item: &T) -> ClusterResult<()> {
        let key = item.key();
        check_key(&key)?;
        let mut items = self.items.write();
        if items.contains_key(&key) {
            return Err(ClusterError::Storage(format!("key already exists: {key}")));
        }
        items.insert(key, item.clone());
        Ok(())
    }

    fn put(&self, item: &T) -> ClusterResult<()> {
        let key = item.key();
        check_key(&key)?;
        self.items.write().insert(key, item.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> ClusterResult<Option<T>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn list(&self, filter: &dyn Fn(&T) -> bool) -> ClusterResult<Vec<T>> {
        Ok(self.items.read().values().filter(|v| filter(v)).cloned().collect())
    }
}

/// Directory of `<key>.json` files.
#[derive(Debug, Clone)]
pub struct JsonDirStore<T> {
    dir: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDirStore<T> {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> ClusterResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            _marker: PhantomData,
        })
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl<T: Keyed + Serialize> JsonDirStore<T> {
    /// Writes `item` to a temp file in the store directory.
    fn stage(&self, item: &T) -> ClusterResult<NamedTempFile> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, item)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }
}

impl<T> Store<T> for JsonDirStore<T>
where
    T: Keyed + Serialize + DeserializeOwned,
{
    fn put_new(&self, item: &T) -> ClusterResult<()> {
        let key = item.key();
        check_key(&key)?;
        let path = self.path_for(&key);
        match self.stage(item)?.persist_noclobber(&path) {
            Ok(_) => {
                debug!(path = %path.display(), "stored new record");
                Ok(())
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Err(ClusterError::Storage(format!("key already exists: {key}")))
            }
            Err(e) => Err(e.error.into()),
        }
    }

    fn put(&self, item: &T) -> ClusterResult<()> {
        let key = item.key();
        check_key(&key)?;
        let path = self.path_for(&key);
        self.stage(item)?.persist(&path).map_err(|e| e.error)?;
        debug!(path = %path.display(), "stored record");
        Ok(())
    }

    fn get(&self, key: &str) -> ClusterResult<Option<T>> {
        check_key(key)?;
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, filter: &dyn Fn(&T) -> bool) -> ClusterResult<Vec<T>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut out = Vec::new();
        for path in paths {
            let item: T = serde_json::from_str(&fs::read_to_string(&path)?)?;
            if filter(&item) {
                out.push(item);
            }
        }
        Ok(out)
    }
}
