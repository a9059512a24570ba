//! Persisted "video watched" flags.
//!
//! Flags live in a durable key-value store under a key derived from the
//! slide id. Reads and writes are best-effort: a failing store never blocks
//! navigation, it only loses the flag across sessions.

use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Prefix for watched-flag keys. Changing it orphans previously stored flags.
pub const WATCHED_KEY_PREFIX: &str = "slides_watched_";

/// Stored value marking a slide as watched.
const WATCHED_VALUE: &str = "1";

/// Durable string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-process store. Can be switched into a failing mode for tests of
/// degraded persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every read and write fails.
    pub fn failing() -> Self {
        Self {
            entries: HashMap::new(),
            failing: true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.failing {
            return Err(Error::StorageError(format!("read of '{}' refused", key)));
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.failing {
            return Err(Error::StorageError(format!("write of '{}' refused", key)));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a JSON object on disk.
///
/// Every write replaces the file through a sibling temp file, so an
/// interrupted write leaves the previous contents in place.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open a store at `path`. A missing file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries: BTreeMap<String, String> = match File::open(&path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file))?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        log::debug!("Opened store {} with {} entries", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    /// Open a store at `path`, starting empty if the file cannot be read.
    ///
    /// Later writes still target `path` and replace whatever was there.
    pub fn open_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::open(path.clone()) {
            Ok(store) => store,
            Err(e) => {
                log::warn!(
                    "Could not read store {}, starting empty: {}",
                    path.display(),
                    e
                );
                Self {
                    path,
                    entries: BTreeMap::new(),
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        write_entries(temp.as_file_mut(), &self.entries)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Serialize entries and flush the buffer, returning any write error.
fn write_entries<W: Write>(writer: W, entries: &BTreeMap<String, String>) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, entries)?;
    writer.flush()?;
    Ok(())
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

/// Watched flags on top of a [`KeyValueStore`].
///
/// Flags written during this session are cached, so a slide stays watched
/// in memory even when the backing write failed.
#[derive(Debug, Clone)]
pub struct WatchedStore<S> {
    store: S,
    cache: HashMap<String, bool>,
}

impl<S: KeyValueStore> WatchedStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    /// Storage key for a slide's flag.
    pub fn key_for(slide_id: &str) -> String {
        format!("{}{}", WATCHED_KEY_PREFIX, slide_id)
    }

    /// Whether the slide's video has been watched to the end.
    pub fn load(&mut self, slide_id: &str) -> bool {
        if let Some(&watched) = self.cache.get(slide_id) {
            return watched;
        }

        let watched = match self.store.get(&Self::key_for(slide_id)) {
            Ok(value) => value.as_deref() == Some(WATCHED_VALUE),
            Err(e) => {
                log::warn!("Could not read watched flag for '{}': {}", slide_id, e);
                false
            }
        };
        self.cache.insert(slide_id.to_string(), watched);
        watched
    }

    /// Mark a slide watched. Persistence failures are logged and dropped.
    pub fn save(&mut self, slide_id: &str) {
        self.cache.insert(slide_id.to_string(), true);
        if let Err(e) = self.store.set(&Self::key_for(slide_id), WATCHED_VALUE) {
            log::warn!("Could not persist watched flag for '{}': {}", slide_id, e);
        }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Release the backing store.
    pub fn into_inner(self) -> S {
        self.store
    }
}
