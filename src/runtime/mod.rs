//! Runtime wiring: configuration, logging setup, and the system that spawns
//! the tracking actor and shuts it down.

pub mod config;
pub mod tracing;
pub mod tracker_system;

pub use self::config::*;
pub use self::tracing::*;
pub use tracker_system::*;
