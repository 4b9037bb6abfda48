//! The upstream REST collaborator: plain request/response, no streaming.

use crate::model::{BookingRecord, CancellationReason};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error("Booking service unavailable: {0}")]
    Unavailable(String),

    #[error("Booking service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unreadable booking service response: {0}")]
    Decode(String),
}

impl ServiceError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

#[async_trait]
pub trait BookingService: Send + Sync {
    /// Bookings the customer currently has open, in any order.
    async fn fetch_active_bookings(&self, identity: &str) -> Result<Vec<BookingRecord>, ServiceError>;

    async fn fetch_cancellation_reasons(&self) -> Result<Vec<CancellationReason>, ServiceError>;
}

/// A fixed answer for every identity. Used by the demo binary.
#[derive(Debug, Clone, Default)]
pub struct StaticBookingService {
    bookings: Vec<BookingRecord>,
    reasons: Vec<CancellationReason>,
}

impl StaticBookingService {
    pub fn new(bookings: Vec<BookingRecord>, reasons: Vec<CancellationReason>) -> Self {
        Self { bookings, reasons }
    }
}

#[async_trait]
impl BookingService for StaticBookingService {
    async fn fetch_active_bookings(&self, _identity: &str) -> Result<Vec<BookingRecord>, ServiceError> {
        Ok(self.bookings.clone())
    }

    async fn fetch_cancellation_reasons(&self) -> Result<Vec<CancellationReason>, ServiceError> {
        Ok(self.reasons.clone())
    }
}

/// Picks the booking to resume: the most recently created one that is not
/// yet delivered or cancelled.
pub fn resumable_booking(bookings: Vec<BookingRecord>) -> Option<BookingRecord> {
    bookings
        .into_iter()
        .filter(|booking| !booking.status.is_terminal() && !booking.booking_id.is_empty())
        .max_by_key(|booking| booking.created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BookingStatus, Coordinate};
    use chrono::{Duration, Utc};

    fn booking(id: &str, status: BookingStatus, age_minutes: i64) -> BookingRecord {
        let mut record = BookingRecord::new(id, Coordinate::new(1.0, 1.0), Coordinate::new(2.0, 2.0))
            .with_status(status);
        record.created_at = Utc::now() - Duration::minutes(age_minutes);
        record
    }

    #[test]
    fn resumes_newest_open_booking() {
        let picked = resumable_booking(vec![
            booking("old", BookingStatus::Allocated, 30),
            booking("done", BookingStatus::Delivered, 1),
            booking("new", BookingStatus::Initiated, 5),
        ]);
        assert_eq!(picked.map(|b| b.booking_id), Some("new".into()));
    }

    #[test]
    fn nothing_to_resume() {
        assert!(resumable_booking(vec![booking("x", BookingStatus::Cancelled, 1)]).is_none());
        assert!(resumable_booking(Vec::new()).is_none());
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(ServiceError::Unavailable("timeout".into()).is_retryable());
        assert!(ServiceError::Rejected { status: 503, message: String::new() }.is_retryable());
        assert!(!ServiceError::Rejected { status: 404, message: String::new() }.is_retryable());
    }
}
