//! Callbacks into the UI layer. The tracker never renders anything itself.

use crate::lifecycle::Notice;
use crate::model::{BookingId, BookingRecord, Coordinate};
use tracing::info;

pub trait TrackingListener: Send + Sync {
    fn on_state_changed(&self, booking: &BookingRecord);

    /// `eta_text` is empty when there is no estimate to show.
    fn on_distance_eta_updated(&self, meters: f64, eta_text: &str);

    /// The driver search for `booking_id` was given up.
    fn on_watchdog_fired(&self, booking_id: &BookingId);

    fn on_route_updated(&self, _booking_id: &BookingId, _route: &[Coordinate]) {}

    fn on_notice(&self, _booking_id: &BookingId, _notice: &Notice) {}
}

/// Writes every callback to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingListener;

impl TrackingListener for LoggingListener {
    fn on_state_changed(&self, booking: &BookingRecord) {
        info!(booking_id = %booking.booking_id, status = %booking.status, "State changed");
    }

    fn on_distance_eta_updated(&self, meters: f64, eta_text: &str) {
        info!(meters = meters.round(), eta = eta_text, "Distance/ETA updated");
    }

    fn on_watchdog_fired(&self, booking_id: &BookingId) {
        info!(%booking_id, "Driver not found");
    }

    fn on_route_updated(&self, booking_id: &BookingId, route: &[Coordinate]) {
        info!(%booking_id, points = route.len(), "Route updated");
    }

    fn on_notice(&self, booking_id: &BookingId, notice: &Notice) {
        info!(%booking_id, ?notice, "Notice");
    }
}
