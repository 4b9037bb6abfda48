//! # Ride Tracker
//!
//! > **The real-time core of a ride booking app.**
//!
//! The tracker consumes a customer's push channel (driver assigned, driver
//! location, pickup, drop, halt, cancellation), reconciles each event against
//! the one booking it is following, keeps a live distance/ETA figure, decodes
//! route geometry, and gives up on the driver search when no driver turns up
//! in time.
//!
//! ## Architecture Notes
//!
//! ### 1. One actor, one booking
//! A [`TrackingActor`](coordinator::TrackingActor) owns the channel
//! subscription, the watchdog and the tracked booking. It processes its mailbox
//! sequentially, so push deliveries, timer expiries and client calls never
//! interleave and no locks guard the state. Multiple trackers are simply
//! multiple actors.
//!
//! ### 2. Late binding
//! The transport, the booking service and the UI listener are injected into
//! `run()` as a [`TrackingContext`](coordinator::TrackingContext), not into
//! `new()`.
//!
//! ### 3. The booking-id guard
//! Every transition first checks that the event belongs to the tracked
//! booking. A late event from a previous ride is a no-op, never an error.
//!
//! ### 4. Errors are values
//! Each concern has its own `thiserror` enum. Malformed push payloads become
//! [`InvalidEvent`](events::InvalidEvent) values and are dropped with a log
//! line; nothing fails across the channel boundary.
//!
//! ## Module Tour
//!
//! - [`model`]: bookings, drivers, coordinates.
//! - [`geo`]: haversine distance, ETA text, polyline codec.
//! - [`events`]: event kinds, payload normalization, dispatch.
//! - [`lifecycle`]: the booking state machine, pure and synchronous.
//! - [`channel`]: the push transport seam and the subscription manager.
//! - [`watchdog`]: the "driver not found" timer.
//! - [`coordinator`]: the actor tying all of the above together.
//! - [`clients`]: [`TrackingClient`](clients::TrackingClient) and the collaborator traits.
//! - [`runtime`]: configuration, logging, [`TrackerSystem`](runtime::TrackerSystem).
//! - [`mock`]: test doubles with expectation builders.
//!
//! ### Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

pub mod channel;
pub mod clients;
pub mod coordinator;
pub mod events;
pub mod geo;
pub mod lifecycle;
pub mod mock;
pub mod model;
pub mod runtime;
pub mod watchdog;
