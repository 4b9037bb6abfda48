//! The client side of the tracker and the collaborators it talks to.

pub mod booking_service;
pub mod listener;
pub mod tracking_client;

pub use booking_service::*;
pub use listener::*;
pub use tracking_client::*;
