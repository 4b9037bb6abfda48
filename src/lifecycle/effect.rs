use crate::model::{BookingStatus, DriverLocationSample};

/// Which end of the ride the ETA is measured to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtaTarget {
    Pickup,
    Dropoff,
}

/// Informational events surfaced to the UI alongside state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    DriverCancelled { reason: Option<String> },
    AutoCancelled,
    Halted,
    Resumed,
    PaymentFailed { message: Option<String> },
    Delivered,
    LookingForNewDriver,
}

/// Work left to the owner of the booking after a transition.
///
/// Effects are ordered; the owner runs them in sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    DisarmWatchdog,
    /// Re-enter the driver search with a fresh window.
    ArmWatchdog,
    /// Encoded route polyline to decode and store.
    UpdateRoute(String),
    UpdateLocation(DriverLocationSample),
    RecomputeEta(EtaTarget),
    ClearEta,
    NotifyStateChanged,
    NotifyWatchdogFired,
    Notice(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The event names a different booking (or none).
    ForeignBooking,
    /// The booking already reached `Delivered` or `Cancelled`.
    Terminal,
    /// The event has no meaning in the current state.
    NotApplicable,
    /// A redelivery of something already applied.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied {
        previous: BookingStatus,
        effects: Vec<Effect>,
    },
    Ignored(IgnoreReason),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn effects(&self) -> &[Effect] {
        match self {
            Self::Applied { effects, .. } => effects,
            Self::Ignored(_) => &[],
        }
    }
}
