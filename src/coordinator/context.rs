use crate::channel::PushTransport;
use crate::clients::{BookingService, TrackingListener};
use std::sync::Arc;

/// Collaborators handed to [`TrackingActor::run`](super::TrackingActor::run).
#[derive(Clone)]
pub struct TrackingContext {
    pub transport: Arc<dyn PushTransport>,
    pub bookings: Arc<dyn BookingService>,
    pub listener: Arc<dyn TrackingListener>,
}

impl TrackingContext {
    pub fn new(
        transport: Arc<dyn PushTransport>,
        bookings: Arc<dyn BookingService>,
        listener: Arc<dyn TrackingListener>,
    ) -> Self {
        Self {
            transport,
            bookings,
            listener,
        }
    }
}
