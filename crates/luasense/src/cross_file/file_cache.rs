//
// cross_file/file_cache.rs
//
// Path-keyed and content-keyed memoization for parsed file data
//

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use lru::LruCache;

/// A parsed value together with the wall-clock time the file was read.
#[derive(Debug)]
struct CacheEntry<T> {
    read_time: SystemTime,
    value: Arc<T>,
}

/// Memoizes a parse of a file, revalidated by modification time.
///
/// An entry is fresh while `modified(path) < read_time`. Stale entries are
/// replaced wholesale by a new parse, never mutated. Entries are never
/// evicted; the map lives as long as the cache.
///
/// Missing or unreadable files yield `T::default()` and store nothing, so a
/// file that appears later is picked up on the next request.
#[derive(Debug)]
pub struct FileCache<T> {
    inner: Mutex<HashMap<PathBuf, CacheEntry<T>>>,
}

impl<T> Default for FileCache<T> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Default> FileCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `path`, parsing the file with `parse` if
    /// there is no fresh entry. The parse runs without holding the lock.
    pub fn get_or_parse<F>(&self, path: &Path, parse: F) -> Arc<T>
    where
        F: FnOnce(&str) -> T,
    {
        let Some(modified) = file_modified(path) else {
            log::trace!("FileCache: {} not found, using empty value", path.display());
            return Arc::new(T::default());
        };

        if let Some(value) = self.get_if_fresh(path, modified) {
            return value;
        }

        // Taken before the read so a write racing the read is seen as newer.
        let read_time = SystemTime::now();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log::trace!("FileCache: failed to read {}: {}", path.display(), e);
                return Arc::new(T::default());
            }
        };

        let value = Arc::new(parse(&content));
        if let Ok(mut guard) = self.inner.lock() {
            guard.insert(
                path.to_path_buf(),
                CacheEntry {
                    read_time,
                    value: Arc::clone(&value),
                },
            );
        }
        value
    }

    fn get_if_fresh(&self, path: &Path, modified: SystemTime) -> Option<Arc<T>> {
        let guard = self.inner.lock().ok()?;
        guard
            .get(path)
            .filter(|entry| modified < entry.read_time)
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Whether any entry (fresh or stale) exists for `path`.
    pub fn contains(&self, path: &Path) -> bool {
        self.inner
            .lock()
            .map(|guard| guard.contains_key(path))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the entry for `path` so the next request reparses.
    pub fn invalidate(&self, path: &Path) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.remove(path);
        }
    }
}

/// Default number of buffer parses kept by a [`ContentCache`]
pub const DEFAULT_CONTENT_CACHE_CAPACITY: usize = 64;

/// Memoizes a parse of in-memory text, keyed by a hash of the text.
///
/// Used for open buffers whose content differs from disk. Buffer text
/// changes on every keystroke, so entries are bounded with LRU eviction.
pub struct ContentCache<T> {
    inner: Mutex<LruCache<u64, Arc<T>>>,
}

impl<T> std::fmt::Debug for ContentCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache").finish_non_exhaustive()
    }
}

impl<T> Default for ContentCache<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CONTENT_CACHE_CAPACITY)
    }
}

impl<T> ContentCache<T> {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(non_zero_capacity(cap))),
        }
    }

    pub fn get_or_parse<F>(&self, text: &str, parse: F) -> Arc<T>
    where
        F: FnOnce(&str) -> T,
    {
        let key = content_hash(text);
        if let Ok(mut guard) = self.inner.lock() {
            if let Some(value) = guard.get(&key) {
                return Arc::clone(value);
            }
        }

        let value = Arc::new(parse(text));
        if let Ok(mut guard) = self.inner.lock() {
            guard.push(key, Arc::clone(&value));
        }
        value
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn non_zero_capacity(cap: usize) -> NonZeroUsize {
    NonZeroUsize::new(cap)
        .or(NonZeroUsize::new(DEFAULT_CONTENT_CACHE_CAPACITY))
        .unwrap_or(NonZeroUsize::MIN)
}

/// 64-bit hash of buffer text.
pub fn content_hash(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Modification time of a regular file, or `None` if it cannot be stat'ed.
pub fn file_modified(path: &Path) -> Option<SystemTime> {
    let metadata = std::fs::metadata(path).ok()?;
    if !metadata.is_file() {
        return None;
    }
    metadata.modified().ok()
}
