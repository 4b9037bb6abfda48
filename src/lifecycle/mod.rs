//! # Booking Lifecycle
//!
//! The transition logic for the tracked booking, kept free of I/O: a
//! transition mutates a [`BookingRecord`](crate::model::BookingRecord) and
//! returns the [`Effect`]s the owner has to carry out (timers, ETA, callbacks).
//!
//! ```text
//! Initiated ──assign──▶ Allocated ──pickup──▶ PickedUp ──drop──▶ Delivered
//!     ▲                     │                  │    ▲
//!     └─looking-for-driver──┘             halt │    │ resume
//!                                              ▼    │
//!                                             Halted
//!
//! any non-terminal state ──driver cancel / auto-cancel──▶ Cancelled
//! Initiated ──watchdog──▶ Cancelled
//! ```
//!
//! Every transition first checks that the event belongs to the tracked
//! booking. Events for any other booking id are ignored without side effects.

pub mod effect;
pub mod error;
pub mod machine;

pub use effect::*;
pub use error::*;
pub use machine::*;
