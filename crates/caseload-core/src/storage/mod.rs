//! Per-user key/value storage.
//!
//! - `StorageKey`: composite of a `Collection` and a `UserId`
//! - `StorageBackend`: raw string store, with `MemoryBackend` and `FileBackend`
//! - `Storage`: typed JSON get/set/has over any backend

pub mod accessor;
pub mod backend;
pub mod key;

pub use accessor::Storage;
pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use key::{Collection, StorageKey};
