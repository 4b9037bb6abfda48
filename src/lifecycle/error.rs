use crate::model::{BookingId, BookingStatus};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LifecycleError {
    /// Only delivered bookings can be rated.
    #[error("Booking {booking_id} is {status}, not delivered")]
    NotDelivered {
        booking_id: BookingId,
        status: BookingStatus,
    },

    #[error("Booking {0} is already rated")]
    AlreadyRated(BookingId),
}
