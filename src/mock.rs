//! # Test Doubles
//!
//! [`MockBookingService`] follows the expectation-builder style: queue the
//! calls you expect with `expect_*().return_ok(..)` / `return_err(..)`, run
//! the code under test, then call [`MockBookingService::verify`].
//!
//! ```ignore
//! let service = Arc::new(MockBookingService::new());
//! service.expect_fetch_active_bookings("c42").return_ok(vec![booking]);
//!
//! // ... activate a tracker with `service.clone()` ...
//! service.verify();
//! ```
//!
//! [`RecordingListener`] keeps every UI callback in order.

use crate::clients::{BookingService, ServiceError, TrackingListener};
use crate::lifecycle::Notice;
use crate::model::{BookingId, BookingRecord, BookingStatus, CancellationReason, Coordinate};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// BOOKING SERVICE
// =============================================================================

enum Expectation {
    ActiveBookings {
        identity: String,
        delay: Option<Duration>,
        response: Result<Vec<BookingRecord>, ServiceError>,
    },
    CancellationReasons {
        response: Result<Vec<CancellationReason>, ServiceError>,
    },
}

type Expectations = Arc<Mutex<VecDeque<Expectation>>>;

/// A [`BookingService`] that answers from a queue of expectations.
///
/// Panics on a call nobody expected, or on an identity other than the expected one.
#[derive(Default)]
pub struct MockBookingService {
    expectations: Expectations,
}

impl MockBookingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects `fetch_active_bookings(identity)`.
    pub fn expect_fetch_active_bookings(&self, identity: &str) -> ActiveBookingsExpectationBuilder {
        ActiveBookingsExpectationBuilder {
            identity: identity.to_string(),
            delay: None,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects `fetch_cancellation_reasons()`.
    pub fn expect_fetch_cancellation_reasons(&self) -> ReasonsExpectationBuilder {
        ReasonsExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = lock(&self.expectations).len();
        if remaining > 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }

    fn next(&self) -> Option<Expectation> {
        lock(&self.expectations).pop_front()
    }
}

#[async_trait]
impl BookingService for MockBookingService {
    async fn fetch_active_bookings(&self, identity: &str) -> Result<Vec<BookingRecord>, ServiceError> {
        match self.next() {
            Some(Expectation::ActiveBookings {
                identity: expected,
                delay,
                response,
            }) => {
                assert_eq!(identity, expected, "fetch_active_bookings called for the wrong identity");
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            _ => panic!("Unexpected request or expectation mismatch: fetch_active_bookings({identity})"),
        }
    }

    async fn fetch_cancellation_reasons(&self) -> Result<Vec<CancellationReason>, ServiceError> {
        match self.next() {
            Some(Expectation::CancellationReasons { response }) => response,
            _ => panic!("Unexpected request or expectation mismatch: fetch_cancellation_reasons"),
        }
    }
}

/// Builder for `fetch_active_bookings` expectations.
pub struct ActiveBookingsExpectationBuilder {
    identity: String,
    delay: Option<Duration>,
    expectations: Expectations,
}

impl ActiveBookingsExpectationBuilder {
    /// Answers only after `delay`, leaving room for other requests in between.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, bookings: Vec<BookingRecord>) {
        self.push(Ok(bookings));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: ServiceError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Vec<BookingRecord>, ServiceError>) {
        lock(&self.expectations).push_back(Expectation::ActiveBookings {
            identity: self.identity,
            delay: self.delay,
            response,
        });
    }
}

/// Builder for `fetch_cancellation_reasons` expectations.
pub struct ReasonsExpectationBuilder {
    expectations: Expectations,
}

impl ReasonsExpectationBuilder {
    pub fn return_ok(self, reasons: Vec<CancellationReason>) {
        lock(&self.expectations).push_back(Expectation::CancellationReasons { response: Ok(reasons) });
    }

    pub fn return_err(self, error: ServiceError) {
        lock(&self.expectations).push_back(Expectation::CancellationReasons { response: Err(error) });
    }
}

// =============================================================================
// LISTENER
// =============================================================================

/// One UI callback as seen by [`RecordingListener`].
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
    StateChanged {
        booking_id: BookingId,
        status: BookingStatus,
    },
    DistanceEta {
        meters: f64,
        text: String,
    },
    WatchdogFired(BookingId),
    RouteUpdated {
        booking_id: BookingId,
        points: usize,
    },
    Notice {
        booking_id: BookingId,
        notice: Notice,
    },
}

#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ListenerEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ListenerEvent> {
        lock(&self.events).clone()
    }

    /// Statuses from every state-change callback, in order.
    pub fn statuses(&self) -> Vec<BookingStatus> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                ListenerEvent::StateChanged { status, .. } => Some(*status),
                _ => None,
            })
            .collect()
    }

    pub fn eta_texts(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                ListenerEvent::DistanceEta { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn watchdog_fired(&self) -> Vec<BookingId> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                ListenerEvent::WatchdogFired(booking_id) => Some(booking_id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                ListenerEvent::Notice { notice, .. } => Some(notice.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: ListenerEvent) {
        lock(&self.events).push(event);
    }
}

impl TrackingListener for RecordingListener {
    fn on_state_changed(&self, booking: &BookingRecord) {
        self.record(ListenerEvent::StateChanged {
            booking_id: booking.booking_id.clone(),
            status: booking.status,
        });
    }

    fn on_distance_eta_updated(&self, meters: f64, eta_text: &str) {
        self.record(ListenerEvent::DistanceEta {
            meters,
            text: eta_text.to_string(),
        });
    }

    fn on_watchdog_fired(&self, booking_id: &BookingId) {
        self.record(ListenerEvent::WatchdogFired(booking_id.clone()));
    }

    fn on_route_updated(&self, booking_id: &BookingId, route: &[Coordinate]) {
        self.record(ListenerEvent::RouteUpdated {
            booking_id: booking_id.clone(),
            points: route.len(),
        });
    }

    fn on_notice(&self, booking_id: &BookingId, notice: &Notice) {
        self.record(ListenerEvent::Notice {
            booking_id: booking_id.clone(),
            notice: notice.clone(),
        });
    }
}
