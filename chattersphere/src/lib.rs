//! `ChatterSphere`: simulated multi-participant chat room engine.

pub mod chat;
pub mod clock;
pub mod config;
pub mod format;
pub mod scheduler;
