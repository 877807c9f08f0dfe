//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Eviction sweep: re-applies the storage quota at configured intervals

mod sweep;

pub use sweep::spawn_sweep_task;
