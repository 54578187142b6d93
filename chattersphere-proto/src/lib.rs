//! Shared data model for `ChatterSphere` sessions.

pub mod export;
pub mod message;
pub mod presence;
pub mod reaction;
