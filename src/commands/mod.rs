//! Command implementations for the stagehand CLI

pub mod check;
pub mod completions;
pub mod install;
pub mod render;
pub mod verify;
pub mod version;
