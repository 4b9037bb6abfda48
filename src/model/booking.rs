//! A customer ride/delivery booking as seen by the tracker.
//!
//! # Lifecycle
//! The `status` moves through `Initiated → Allocated → PickedUp → Delivered`,
//! with `Halted` as a resumable side branch of `PickedUp` and `Cancelled` as the
//! other terminal state. See [`crate::lifecycle`] for the transition table.
use crate::model::{Coordinate, DriverAssignment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Opaque booking identifier, stable for the lifetime of a ride.
///
/// The empty id is the "absent" value produced when a push payload carries no
/// booking id. It never matches a tracked booking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for BookingId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BookingId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Initiated,
    Allocated,
    PickedUp,
    Halted,
    Delivered,
    Cancelled,
}

impl BookingStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// The driver-search sub-state, the only one the watchdog applies to.
    pub const fn is_searching(self) -> bool {
        matches!(self, Self::Initiated)
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Initiated => "initiated",
            Self::Allocated => "allocated",
            Self::PickedUp => "picked_up",
            Self::Halted => "halted",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Immediate pickups get a short "driver not found" window, scheduled ones a long one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PickupKind {
    #[default]
    Immediate,
    Scheduled,
}

/// Who ended a cancelled booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancellationSource {
    Driver,
    System,
    /// No driver was found before the watchdog window closed.
    Watchdog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking_id: BookingId,
    pub status: BookingStatus,
    pub pickup: Coordinate,
    pub dropoff: Coordinate,
    #[serde(default)]
    pub pickup_kind: PickupKind,
    #[serde(default)]
    pub driver: Option<DriverAssignment>,
    /// Decoded route geometry, empty until a route arrives.
    #[serde(default)]
    pub route: Vec<Coordinate>,
    pub created_at: DateTime<Utc>,
    /// Post-terminal flag, only ever set on a delivered booking.
    #[serde(default)]
    pub rated: bool,
    #[serde(default)]
    pub cancellation: Option<CancellationSource>,
}

impl BookingRecord {
    /// Creates a freshly initiated booking with no driver.
    pub fn new(booking_id: impl Into<BookingId>, pickup: Coordinate, dropoff: Coordinate) -> Self {
        Self {
            booking_id: booking_id.into(),
            status: BookingStatus::Initiated,
            pickup,
            dropoff,
            pickup_kind: PickupKind::Immediate,
            driver: None,
            route: Vec::new(),
            created_at: Utc::now(),
            rated: false,
            cancellation: None,
        }
    }

    pub fn scheduled(mut self) -> Self {
        self.pickup_kind = PickupKind::Scheduled;
        self
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }
}

/// One entry of the upstream cancellation reason list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationReason {
    pub id: String,
    pub label: String,
}
