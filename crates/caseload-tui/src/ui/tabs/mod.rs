//! Tab-specific content rendering.

pub mod students;
pub mod teachers;
