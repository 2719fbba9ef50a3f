use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::backend::StorageBackend;
use super::key::{Collection, StorageKey};
use crate::error::{StoreError, StoreResult};
use crate::models::UserId;

/// Typed JSON accessor over a [`StorageBackend`], namespaced per user.
pub struct Storage<B> {
    backend: B,
}

impl<B: StorageBackend> Storage<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Whether anything has ever been stored under `(collection, user)`.
    pub fn has(&self, collection: Collection, user: &UserId) -> StoreResult<bool> {
        self.backend.contains(&StorageKey::new(collection, user.clone()))
    }

    /// Read and decode the stored value, or return `default` when nothing is stored.
    ///
    /// The default is not written back. A stored value that fails to decode is
    /// logged, handed to [`StorageBackend::preserve`] so the next write does not
    /// destroy it, and also yields `default`.
    pub fn get<T: DeserializeOwned>(
        &mut self,
        collection: Collection,
        user: &UserId,
        default: T,
    ) -> StoreResult<T> {
        let key = StorageKey::new(collection, user.clone());
        let Some(raw) = self.backend.read(&key)? else {
            debug!(key = %key, "Nothing stored, using default");
            return Ok(default);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Stored value is corrupt, using default");
                self.backend.preserve(&key, &raw)?;
                Ok(default)
            }
        }
    }

    /// Encode `value` as JSON and store it under `(collection, user)`.
    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        collection: Collection,
        user: &UserId,
        value: &T,
    ) -> StoreResult<()> {
        let key = StorageKey::new(collection, user.clone());
        let contents = serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.backend.write(&key, &contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    fn user(id: &str) -> UserId {
        UserId::from(id)
    }

    #[test]
    fn test_get_returns_default_without_persisting() {
        let mut storage = Storage::new(MemoryBackend::new());

        let value: Vec<u32> = storage.get(Collection::Students, &user("u"), vec![7]).unwrap();

        assert_eq!(value, vec![7]);
        assert!(!storage.has(Collection::Students, &user("u")).unwrap());
        assert!(storage.backend().is_empty());
    }

    #[test]
    fn test_set_then_get() {
        let mut storage = Storage::new(MemoryBackend::new());
        storage.set(Collection::Teachers, &user("u"), &vec!["a", "b"]).unwrap();

        assert!(storage.has(Collection::Teachers, &user("u")).unwrap());
        let value: Vec<String> = storage.get(Collection::Teachers, &user("u"), Vec::new()).unwrap();
        assert_eq!(value, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_users_do_not_see_each_other() {
        let mut storage = Storage::new(MemoryBackend::new());
        storage.set(Collection::Students, &user("alice"), &vec![1, 2]).unwrap();

        let bob: Vec<i32> = storage.get(Collection::Students, &user("bob"), Vec::new()).unwrap();
        assert!(bob.is_empty());
        assert!(!storage.has(Collection::Students, &user("bob")).unwrap());
    }

    #[test]
    fn test_corrupt_value_reads_as_default() {
        let mut storage = Storage::new(MemoryBackend::new());
        let key = StorageKey::students(&user("u"));
        storage.backend_mut().write(&key, "{not json").unwrap();

        let value: Vec<u32> = storage.get(Collection::Students, &user("u"), Vec::new()).unwrap();
        assert!(value.is_empty());
        assert!(storage.has(Collection::Students, &user("u")).unwrap());
        assert_eq!(storage.backend().preserved(&key), Some("{not json"));
    }
}
