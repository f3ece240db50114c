//! Small helpers shared across the codebase

pub mod fs;
pub mod version;
