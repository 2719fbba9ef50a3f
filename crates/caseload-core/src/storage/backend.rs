use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::key::StorageKey;
use crate::error::{StoreError, StoreResult};

/// Raw string storage addressed by [`StorageKey`].
///
/// Implementations only move strings around; (de)serialization happens in
/// [`super::Storage`].
pub trait StorageBackend {
    fn contains(&self, key: &StorageKey) -> StoreResult<bool>;
    fn read(&self, key: &StorageKey) -> StoreResult<Option<String>>;
    fn write(&mut self, key: &StorageKey, value: &str) -> StoreResult<()>;

    /// Keep a copy of an unreadable payload out of the way of later writes.
    fn preserve(&mut self, key: &StorageKey, value: &str) -> StoreResult<()>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    fn contains(&self, key: &StorageKey) -> StoreResult<bool> {
        (**self).contains(key)
    }

    fn read(&self, key: &StorageKey) -> StoreResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &StorageKey, value: &str) -> StoreResult<()> {
        (**self).write(key, value)
    }

    fn preserve(&mut self, key: &StorageKey, value: &str) -> StoreResult<()> {
        (**self).preserve(key, value)
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: HashMap<StorageKey, String>,
    preserved: HashMap<StorageKey, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The last unreadable payload set aside for `key`.
    pub fn preserved(&self, key: &StorageKey) -> Option<&str> {
        self.preserved.get(key).map(String::as_str)
    }
}

impl StorageBackend for MemoryBackend {
    fn contains(&self, key: &StorageKey) -> StoreResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    fn read(&self, key: &StorageKey) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &StorageKey, value: &str) -> StoreResult<()> {
        self.entries.insert(key.clone(), value.to_string());
        Ok(())
    }

    fn preserve(&mut self, key: &StorageKey, value: &str) -> StoreResult<()> {
        self.preserved.insert(key.clone(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// File backend
// ============================================================================

/// Stores each key as `<root>/<user>/<collection>.json`.
///
/// Unreadable payloads are copied to `<collection>.json.corrupt` next to it.
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: PathBuf) -> StoreResult<Self> {
        std::fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, key: &StorageKey) -> StoreResult<PathBuf> {
        let user = key.user().as_str();
        if user.is_empty() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(escape_path_segment(user)))
    }

    fn path_for(&self, key: &StorageKey) -> StoreResult<PathBuf> {
        Ok(self
            .user_dir(key)?
            .join(format!("{}.json", key.collection())))
    }
}

impl StorageBackend for FileBackend {
    fn contains(&self, key: &StorageKey) -> StoreResult<bool> {
        Ok(self.path_for(key)?.exists())
    }

    fn read(&self, key: &StorageKey) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        Ok(Some(contents))
    }

    fn write(&mut self, key: &StorageKey, value: &str) -> StoreResult<()> {
        let dir = self.user_dir(key)?;
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| StoreError::io(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))?;

        debug!(key = %key, bytes = value.len(), "Wrote storage file");
        Ok(())
    }

    fn preserve(&mut self, key: &StorageKey, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?.with_extension("json.corrupt");
        std::fs::write(&path, value).map_err(|e| StoreError::io(&path, e))?;
        warn!(key = %key, path = %path.display(), "Preserved unreadable storage file");
        Ok(())
    }
}

/// Map a user id onto a single safe directory name.
///
/// Lowercase ASCII letters, digits, `-` and `_` pass through; every other byte
/// becomes `%XX`. Uppercase letters are escaped too, so ids differing only in
/// case stay apart on case-insensitive filesystems.
fn escape_path_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;

    #[test]
    fn test_escape_path_segment() {
        assert_eq!(escape_path_segment("user-1_a"), "user-1_a");
        assert_eq!(escape_path_segment("a/b"), "a%2Fb");
        assert_eq!(escape_path_segment(".."), "%2E%2E");
        assert_eq!(escape_path_segment("me@x.io"), "me%40x%2Eio");
        assert_eq!(escape_path_segment("Alice"), "%41lice");
    }

    #[test]
    fn test_ids_differing_in_case_get_distinct_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();

        let upper = backend.path_for(&StorageKey::students(&UserId::from("Alice"))).unwrap();
        let lower = backend.path_for(&StorageKey::students(&UserId::from("alice"))).unwrap();

        // Must differ even when compared the way APFS and NTFS compare names
        assert_ne!(
            upper.to_string_lossy().to_lowercase(),
            lower.to_string_lossy().to_lowercase()
        );
    }

    #[test]
    fn test_memory_backend_read_write_preserve() {
        let mut backend = MemoryBackend::new();
        let key = StorageKey::students(&UserId::from("u1"));

        assert!(!backend.contains(&key).unwrap());
        assert_eq!(backend.read(&key).unwrap(), None);

        backend.write(&key, "[]").unwrap();
        assert!(backend.contains(&key).unwrap());
        assert_eq!(backend.read(&key).unwrap().as_deref(), Some("[]"));

        backend.preserve(&key, "{bad").unwrap();
        assert_eq!(backend.preserved(&key), Some("{bad"));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_file_backend_partitions_by_user() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FileBackend::new(dir.path().to_path_buf()).unwrap();

        let alice = StorageKey::students(&UserId::from("alice"));
        let bob = StorageKey::students(&UserId::from("bob"));

        backend.write(&alice, "[1]").unwrap();
        assert!(backend.contains(&alice).unwrap());
        assert!(!backend.contains(&bob).unwrap());

        assert!(dir.path().join("alice").join("students.json").exists());
        assert_eq!(backend.read(&alice).unwrap().as_deref(), Some("[1]"));
        assert_eq!(backend.read(&bob).unwrap(), None);
    }

    #[test]
    fn test_file_backend_overwrites_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FileBackend::new(dir.path().to_path_buf()).unwrap();
        let key = StorageKey::teachers(&UserId::from("u"));

        backend.write(&key, "[1]").unwrap();
        backend.write(&key, "[2]").unwrap();

        assert_eq!(backend.read(&key).unwrap().as_deref(), Some("[2]"));
        assert!(!dir.path().join("u").join("teachers.json.tmp").exists());
    }

    #[test]
    fn test_file_backend_preserves_next_to_original() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FileBackend::new(dir.path().to_path_buf()).unwrap();
        let key = StorageKey::students(&UserId::from("u"));

        backend.write(&key, "[{oops").unwrap();
        backend.preserve(&key, "[{oops").unwrap();
        backend.write(&key, "[]").unwrap();

        let saved = std::fs::read_to_string(dir.path().join("u").join("students.json.corrupt")).unwrap();
        assert_eq!(saved, "[{oops");
        assert_eq!(backend.read(&key).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_file_backend_rejects_empty_user() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();
        let key = StorageKey::students(&UserId::from(""));

        assert!(matches!(backend.contains(&key), Err(StoreError::InvalidKey(_))));
    }
}
