//! File-backed store persisting each key as a JSON document
//!
//! Provides a `FileStore` that writes serializable values to JSON files with
//! timestamps and an optional expiry, so a cached value survives restarts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{is_valid_key, BoxError, Store};

/// File extension used for stored entries
const ENTRY_EXTENSION: &str = "json";

/// File extension for entries still being written
const TEMP_EXTENSION: &str = "tmp";

/// Longest TTL an entry can carry (about 1000 years); larger values saturate
pub const MAX_TTL_HOURS: u64 = 24 * 365 * 1000;

/// Distinguishes temp files written concurrently by one process
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Errors that can occur when reading or writing stored entries
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// Key cannot be mapped to a file name
    #[error("Invalid store key: '{0}'")]
    InvalidKey(String),

    /// Filesystem operation failed
    #[error("I/O error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Entry could not be encoded or decoded
    #[error("Failed to (de)serialize entry {}: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Wrapper struct for entries stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry<T> {
    /// The stored value
    data: T,
    /// When the value was written
    cached_at: DateTime<Utc>,
    /// When the entry stops counting as a hit, if ever
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// Result of reading an entry, including metadata about its freshness
#[derive(Debug)]
pub struct CachedData<T> {
    /// The stored value
    pub data: T,
    /// When the value was written
    pub cached_at: DateTime<Utc>,
    /// Whether the entry has passed its expiry
    pub is_expired: bool,
}

/// Stores values as JSON files in a directory
///
/// Uses an XDG-compliant cache directory by default (`~/.cache/valuecache/`
/// on Linux). When a TTL is configured, expired entries read as absent through
/// the [`Store`] interface, while [`FileStore::read_entry`] still returns them
/// flagged with `is_expired = true` for callers that accept stale data.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory where entry files are stored
    dir: PathBuf,
    /// Lifetime of newly written entries
    ttl: Option<Duration>,
}

impl FileStore {
    /// Creates a FileStore in the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        Self::default_dir().map(Self::with_dir)
    }

    /// Returns the default directory used by [`FileStore::new`]
    pub fn default_dir() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "valuecache")?;
        Some(project_dirs.cache_dir().to_path_buf())
    }

    /// Creates a FileStore with a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir, ttl: None }
    }

    /// Sets how long newly written entries stay fresh
    ///
    /// Values above [`MAX_TTL_HOURS`] are clamped to it.
    pub fn with_ttl_hours(mut self, hours: u64) -> Self {
        // MAX_TTL_HOURS fits both i64 and chrono's Duration range
        let hours = hours.min(MAX_TTL_HOURS) as i64;
        self.ttl = Some(Duration::hours(hours));
        self
    }

    /// Returns the lifetime given to newly written entries, if limited
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns the directory entries are stored in
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path to the entry file for the given key
    fn entry_path(&self, key: &str) -> Result<PathBuf, FileStoreError> {
        if !is_valid_key(key) {
            return Err(FileStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", key, ENTRY_EXTENSION)))
    }

    fn io_error(path: &Path, source: io::Error) -> FileStoreError {
        FileStoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Writes a value under `key`, creating the directory if needed
    pub fn write<T: Serialize>(&self, key: &str, data: &T) -> Result<(), FileStoreError> {
        let path = self.entry_path(key)?;

        let now = Utc::now();
        let entry = StoredEntry {
            data,
            cached_at: now,
            expires_at: self.ttl.and_then(|ttl| now.checked_add_signed(ttl)),
        };

        let json = serde_json::to_string_pretty(&entry).map_err(|source| {
            FileStoreError::Serialization {
                path: path.clone(),
                source,
            }
        })?;

        fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(&self.dir, e))?;

        // Readers only ever see a complete old or new file: write aside, then rename over.
        let temp_path = self.temp_path(key);
        if let Err(e) = fs::write(&temp_path, json) {
            let _ = fs::remove_file(&temp_path);
            return Err(Self::io_error(&temp_path, e));
        }
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(Self::io_error(&path, e));
        }

        debug!(key, path = %path.display(), "wrote store entry");
        Ok(())
    }

    /// Returns a unique path next to the entry for staging a write
    fn temp_path(&self, key: &str) -> PathBuf {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let sequence = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(
            "{}.{}.{}.{}.{}.{}",
            key,
            ENTRY_EXTENSION,
            process::id(),
            nanos,
            sequence,
            TEMP_EXTENSION
        ))
    }

    /// Reads the entry under `key`
    ///
    /// # Returns
    /// * `Ok(None)` if no entry exists
    /// * `Ok(Some(CachedData))` if the entry exists, expired or not
    /// * `Err` if the file cannot be read or parsed
    pub fn read_entry<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<CachedData<T>>, FileStoreError> {
        let path = self.entry_path(key)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(&path, e)),
        };

        let entry: StoredEntry<T> = serde_json::from_str(&content)
            .map_err(|source| FileStoreError::Serialization { path, source })?;

        let is_expired = entry.expires_at.is_some_and(|expires| Utc::now() > expires);

        Ok(Some(CachedData {
            data: entry.data,
            cached_at: entry.cached_at,
            is_expired,
        }))
    }

    /// Removes the entry under `key`, returning whether one existed
    pub fn delete(&self, key: &str) -> Result<bool, FileStoreError> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::io_error(&path, e)),
        }
    }

    /// Lists the keys that currently have an entry, sorted
    pub fn keys(&self) -> Result<Vec<String>, FileStoreError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::io_error(&self.dir, e)),
        };

        let mut keys = Vec::new();
        for dir_entry in read_dir {
            let path = dir_entry.map_err(|e| Self::io_error(&self.dir, e))?.path();
            // Skips staged `<key>.json.<pid>.<nanos>.<seq>.tmp` files as well
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if is_valid_key(stem) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Removes every entry, returning how many were deleted
    pub fn clear(&self) -> Result<usize, FileStoreError> {
        let keys = self.keys()?;
        let mut removed = 0;
        for key in &keys {
            if self.delete(key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl<T> Store<T> for FileStore
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<T>, BoxError> {
        let store = self.clone();
        let owned_key = key.to_string();
        let entry = tokio::task::spawn_blocking(move || store.read_entry::<T>(&owned_key)).await??;

        match entry {
            Some(entry) if entry.is_expired => {
                debug!(key, cached_at = %entry.cached_at, "store entry expired, treating as miss");
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.data)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &T) -> Result<(), BoxError> {
        // Encode up front so the blocking task owns plain JSON rather than `T`.
        let json = serde_json::to_value(value)?;
        let store = self.clone();
        let owned_key = key.to_string();
        tokio::task::spawn_blocking(move || store.write(&owned_key, &json)).await??;
        Ok(())
    }
}
