use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Every push event kind the tracker binds on the customer channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    DriverAssigned,
    DriverLocation,
    PickupConfirmed,
    DropConfirmed,
    BookingCancelledByDriver,
    PaymentFailed,
    AutoCancelled,
    HaltResumed,
    BookingHalted,
    LookingForNewDriver,
}

impl EventKind {
    pub const ALL: [EventKind; 10] = [
        EventKind::DriverAssigned,
        EventKind::DriverLocation,
        EventKind::PickupConfirmed,
        EventKind::DropConfirmed,
        EventKind::BookingCancelledByDriver,
        EventKind::PaymentFailed,
        EventKind::AutoCancelled,
        EventKind::HaltResumed,
        EventKind::BookingHalted,
        EventKind::LookingForNewDriver,
    ];

    /// The tag used on the wire.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::DriverAssigned => "driver-assigned",
            Self::DriverLocation => "driver-location",
            Self::PickupConfirmed => "pickup-confirmed",
            Self::DropConfirmed => "drop-confirmed",
            Self::BookingCancelledByDriver => "booking-cancelled-by-driver",
            Self::PaymentFailed => "payment-failed",
            Self::AutoCancelled => "auto-cancelled",
            Self::HaltResumed => "halt-resumed",
            Self::BookingHalted => "booking-halted",
            Self::LookingForNewDriver => "looking-for-new-driver",
        }
    }

    /// Parses a wire tag. Accepts the kebab-case tag or the PascalCase variant name.
    pub fn from_wire(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.wire_name() == tag || format!("{kind:?}") == tag)
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}
