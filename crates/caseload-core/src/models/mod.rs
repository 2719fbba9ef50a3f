//! Data models for caseload records.
//!
//! - `Student`: a student record with optional extended profile fields
//! - `Teacher`: a teacher that students can be assigned to
//! - `StudentId`, `TeacherId`, `UserId`: string identifiers
//!
//! Field names serialize in camelCase so the stored JSON keeps the layout the
//! browser UI wrote.

pub mod ids;
pub mod student;
pub mod teacher;

pub use ids::{StudentId, TeacherId, UserId};
pub use student::{
    Attachment, DisabilityLevel, Gender, GuardianStatus, NewStudent, ResidenceType, SafetyFlags,
    Student, StudentDetails, StudentPatch,
};
pub use teacher::Teacher;
