use crate::channel::SubscriptionError;
use crate::clients::ServiceError;
use crate::lifecycle::LifecycleError;
use crate::model::BookingId;
use thiserror::Error;

/// Errors returned by [`TrackingClient`](crate::clients::TrackingClient).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackerError {
    #[error("Actor closed")]
    ActorClosed,

    #[error("Actor dropped response channel")]
    ActorDropped,

    /// The tracker was disposed; nothing is applied any more.
    #[error("Tracker disposed")]
    Disposed,

    #[error("Booking id must not be empty")]
    EmptyBookingId,

    #[error("Booking not tracked: {0}")]
    NotTracked(BookingId),

    /// A newer activation or a deactivation overtook this one.
    #[error("Activation for {0} was superseded")]
    Superseded(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl TrackerError {
    /// Whether calling again later (e.g. on the next screen focus) can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Subscription(e) => e.is_retryable(),
            Self::Service(e) => e.is_retryable(),
            Self::Superseded(_) | Self::TaskFailed(_) => true,
            _ => false,
        }
    }
}
