//! Repository over the per-user student and teacher collections.
//!
//! The repository keeps an in-memory copy of both collections for the current
//! user and writes the full collection through to storage after every
//! mutation. The storage backend is injected, so tests run against
//! `MemoryBackend` and the app against `FileBackend`.

pub mod id_gen;
pub mod student_repo;

pub use id_gen::IdGenerator;
pub use student_repo::{SessionState, StudentRepository};
