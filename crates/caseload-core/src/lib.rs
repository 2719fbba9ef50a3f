//! Core library for caseload.
//!
//! Tracks students with disabilities and their assigned teachers, partitioned
//! per signed-in user:
//!
//! - `models`: student and teacher records
//! - `storage`: composite per-user keys, storage backends, typed accessor
//! - `repo`: the in-memory repository with write-through persistence
//! - `filter`: dashboard search and level filtering
//! - `config`: application configuration

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod repo;
pub mod seed;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use filter::{filter_students, LevelFilter, StudentFilter};
pub use models::{
    Attachment, DisabilityLevel, NewStudent, Student, StudentDetails, StudentId, StudentPatch,
    Teacher, TeacherId, UserId,
};
pub use repo::{SessionState, StudentRepository};
pub use storage::{Collection, FileBackend, MemoryBackend, Storage, StorageBackend, StorageKey};
