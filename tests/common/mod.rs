#![allow(dead_code)]

use ride_tracker::channel::{ChannelMessage, InMemoryTransport};
use ride_tracker::clients::TrackingClient;
use ride_tracker::coordinator::{TrackingActor, TrackingContext, TrackingSnapshot};
use ride_tracker::mock::{MockBookingService, RecordingListener};
use ride_tracker::model::{BookingId, BookingRecord, Coordinate};
use ride_tracker::runtime::TrackerConfig;
use serde_json::Value;
use std::sync::Arc;

pub const CUSTOMER: &str = "c42";
pub const CHANNEL: &str = "private-customer.c42";

/// MG Road, Bengaluru.
pub const PICKUP: Coordinate = Coordinate::new(12.9756, 77.6066);
/// Kempegowda airport.
pub const DROPOFF: Coordinate = Coordinate::new(13.1986, 77.7066);

/// The reference polyline, three points.
pub const ROUTE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

pub fn booking(id: &str) -> BookingRecord {
    BookingRecord::new(id, PICKUP, DROPOFF)
}

/// A running tracker wired to in-memory collaborators.
pub struct Harness {
    pub client: TrackingClient,
    pub transport: Arc<InMemoryTransport>,
    pub service: Arc<MockBookingService>,
    pub listener: Arc<RecordingListener>,
    pub handle: tokio::task::JoinHandle<()>,
}

impl Harness {
    pub fn start() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        let transport = Arc::new(InMemoryTransport::new());
        let service = Arc::new(MockBookingService::new());
        let listener = Arc::new(RecordingListener::new());

        let (actor, client) = TrackingActor::new(config);
        let context = TrackingContext::new(transport.clone(), service.clone(), listener.clone());
        let handle = tokio::spawn(actor.run(context));

        Self {
            client,
            transport,
            service,
            listener,
            handle,
        }
    }

    /// Activates `CUSTOMER` with the service answering `bookings`.
    pub async fn activate_with(&self, bookings: Vec<BookingRecord>) -> Option<BookingId> {
        self.service.expect_fetch_active_bookings(CUSTOMER).return_ok(bookings);
        self.client.activate(CUSTOMER).await.expect("activation succeeds")
    }

    /// Activates `CUSTOMER` and starts tracking `record`.
    pub async fn follow(&self, record: BookingRecord) {
        self.activate_with(Vec::new()).await;
        self.client.track(record).await.expect("tracking starts");
    }

    pub async fn deliver(&self, kind: &str, payload: Value) {
        self.deliver_on(CHANNEL, kind, payload).await;
    }

    pub async fn deliver_on(&self, channel: &str, kind: &str, payload: Value) {
        self.client
            .deliver(ChannelMessage::new(channel, kind, payload))
            .await
            .expect("delivery never fails while the tracker is alive");
    }

    pub async fn snapshot(&self) -> TrackingSnapshot {
        self.client.snapshot().await.expect("snapshot")
    }
}
