//! Atomic JSON file operations with ACID guarantees.
//!
//! Provides a thin layer for safe concurrent access to the JSON files backing
//! the file-system stores.

use recipebox_core::error::RecipeBoxError;
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Errors that can occur during atomic JSON operations.
#[derive(Debug)]
pub enum AtomicJsonError {
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON serialization/deserialization error.
    JsonError(serde_json::Error),
    /// File locking error.
    LockError(String),
}

impl std::fmt::Display for AtomicJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomicJsonError::IoError(e) => write!(f, "I/O error: {}", e),
            AtomicJsonError::JsonError(e) => write!(f, "JSON error: {}", e),
            AtomicJsonError::LockError(e) => write!(f, "Lock error: {}", e),
        }
    }
}

impl std::error::Error for AtomicJsonError {}

impl From<std::io::Error> for AtomicJsonError {
    fn from(e: std::io::Error) -> Self {
        AtomicJsonError::IoError(e)
    }
}

impl From<serde_json::Error> for AtomicJsonError {
    fn from(e: serde_json::Error) -> Self {
        AtomicJsonError::JsonError(e)
    }
}

impl From<AtomicJsonError> for RecipeBoxError {
    fn from(e: AtomicJsonError) -> Self {
        match e {
            AtomicJsonError::IoError(io) => RecipeBoxError::from(io),
            AtomicJsonError::JsonError(json) => RecipeBoxError::from(json),
            AtomicJsonError::LockError(message) => RecipeBoxError::io(message),
        }
    }
}

/// A handle to an atomic JSON file.
///
/// Provides:
/// - **Atomicity**: Updates are all-or-nothing via tmp file + atomic rename
/// - **Isolation**: File locking prevents concurrent modifications
/// - **Durability**: Explicit fsync before rename
///
/// All operations block; async callers run them on the blocking pool.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for AtomicJsonFile<T> {
    fn clone(&self) -> Self {
        Self::new(self.path.clone())
    }
}

impl<T> AtomicJsonFile<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>, AtomicJsonError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let data: T = serde_json::from_str(&content)?;
        Ok(Some(data))
    }

    /// Saves data atomically (tmp file + rename).
    pub fn save(&self, data: &T) -> Result<(), AtomicJsonError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(data)?;

        let tmp_path = self.get_temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;

        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    /// Performs a transactional read-modify-write under an exclusive lock.
    ///
    /// `f` sees the current contents (or `default_value` if the file does not
    /// exist yet). When it returns `Ok`, the modified data is written back and
    /// its result returned; when it returns `Err`, the file is left untouched.
    pub fn update<R, F>(&self, default_value: T, f: F) -> Result<R, AtomicJsonError>
    where
        F: FnOnce(&mut T) -> Result<R, AtomicJsonError>,
    {
        let _lock = self.acquire_lock()?;

        let mut data = self.load()?.unwrap_or(default_value);
        let result = f(&mut data)?;
        self.save(&data)?;

        Ok(result)
    }

    /// Loads the file while holding the lock, so a concurrent `update` is never
    /// observed half-way.
    pub fn load_locked(&self) -> Result<Option<T>, AtomicJsonError> {
        let _lock = self.acquire_lock()?;
        self.load()
    }

    fn get_temp_path(&self) -> Result<PathBuf, AtomicJsonError> {
        let parent = self.path.parent().ok_or_else(|| {
            AtomicJsonError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            ))
        })?;

        let file_name = self.path.file_name().ok_or_else(|| {
            AtomicJsonError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no file name",
            ))
        })?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(parent.join(tmp_name))
    }

    fn acquire_lock(&self) -> Result<FileLock, AtomicJsonError> {
        FileLock::acquire(&self.path)
    }
}

/// A file lock guard that releases the lock when dropped.
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, AtomicJsonError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        use fs2::FileExt;
        file.lock_exclusive()
            .map_err(|e| AtomicJsonError::LockError(format!("Failed to acquire lock: {}", e)))?;

        Ok(FileLock { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // The lock file stays on disk; removing it here would let a waiter
        // lock an unlinked inode while a newcomer locks a fresh one.
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        name: String,
        count: u32,
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicJsonFile::<Counter>::new(temp_dir.path().join("test.json"));

        file.save(&Counter {
            name: "test".to_string(),
            count: 42,
        })
        .unwrap();

        let loaded = file.load().unwrap().unwrap();
        assert_eq!(loaded.name, "test");
        assert_eq!(loaded.count, 42);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicJsonFile::<Counter>::new(temp_dir.path().join("missing.json"));
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_update_returns_closure_result() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicJsonFile::<Counter>::new(temp_dir.path().join("nested/test.json"));
        let default = Counter {
            name: "default".to_string(),
            count: 0,
        };

        let first = file
            .update(default.clone(), |c| {
                c.count += 10;
                Ok(c.count)
            })
            .unwrap();
        let second = file
            .update(default, |c| {
                c.count += 5;
                Ok(c.count)
            })
            .unwrap();

        assert_eq!(first, 10);
        assert_eq!(second, 15);
        assert_eq!(file.load().unwrap().unwrap().count, 15);
    }

    #[test]
    fn test_failed_update_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicJsonFile::<Counter>::new(temp_dir.path().join("test.json"));
        let initial = Counter {
            name: "x".to_string(),
            count: 1,
        };
        file.save(&initial).unwrap();

        let result: Result<(), _> = file.update(initial.clone(), |c| {
            c.count = 99;
            Err(AtomicJsonError::LockError("abort".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(file.load().unwrap().unwrap(), initial);
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.json");
        let file = AtomicJsonFile::<Counter>::new(file_path.clone());

        file.save(&Counter {
            name: "t".to_string(),
            count: 1,
        })
        .unwrap();

        assert!(!temp_dir.path().join(".test.json.tmp").exists());
        assert!(file_path.exists());
    }

    #[test]
    fn test_lock_is_released_on_drop() {
        use fs2::FileExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.json");
        let lock = FileLock::acquire(&path).unwrap();

        let other = File::open(path.with_extension("lock")).unwrap();
        assert!(other.try_lock_exclusive().is_err());

        drop(lock);
        other.try_lock_exclusive().unwrap();
        FileExt::unlock(&other).unwrap();
    }
}
