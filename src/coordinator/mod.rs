//! # Tracking Coordinator
//!
//! The actor that owns everything about the ride being tracked: the channel
//! subscription, the watchdog, the booking record and its live ETA.
//!
//! ## Concurrency
//! The actor processes one [`TrackingRequest`] at a time, to completion.
//! Push deliveries, watchdog expiries and client calls therefore never
//! interleave. Calls to the booking service run on their own tasks and come
//! back through the mailbox, where they are checked against the current
//! activation before anything is applied.

pub mod actor;
pub mod context;
pub mod error;
pub mod message;
mod state;

pub use actor::*;
pub use context::*;
pub use error::*;
pub use message::*;
