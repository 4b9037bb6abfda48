//! Scripted ride against an in-memory channel.
//!
//! Plays one booking from driver search to a rated delivery and logs every
//! callback the UI would receive.

use ride_tracker::channel::{channel_name, ChannelMessage, InMemoryTransport};
use ride_tracker::clients::{LoggingListener, StaticBookingService};
use ride_tracker::coordinator::TrackingContext;
use ride_tracker::model::{BookingRecord, CancellationReason, Coordinate};
use ride_tracker::runtime::{setup_tracing, TrackerConfig, TrackerSystem};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, Instrument};

const CUSTOMER: &str = "customer-42";
const BOOKING: &str = "BK-1001";

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = TrackerConfig::load(Some("ride-tracker")).map_err(|e| e.to_string())?;
    info!(?config, "Starting ride tracker demo");

    let booking = BookingRecord::new(
        BOOKING,
        Coordinate::new(12.9756, 77.6066),
        Coordinate::new(13.1986, 77.7066),
    );
    let reasons = vec![
        CancellationReason {
            id: "driver-late".to_string(),
            label: "Driver is taking too long".to_string(),
        },
        CancellationReason {
            id: "changed-plans".to_string(),
            label: "Change of plans".to_string(),
        },
    ];
    let context = TrackingContext::new(
        Arc::new(InMemoryTransport::new()),
        Arc::new(StaticBookingService::new(vec![booking], reasons)),
        Arc::new(LoggingListener),
    );
    let system = TrackerSystem::new(config.clone(), context);

    let resumed = system
        .client
        .activate(CUSTOMER)
        .await
        .map_err(|e| e.to_string())?;
    info!(?resumed, "Activated");

    let channel = channel_name(&config.channel_prefix, CUSTOMER);
    let script = [
        ("driver-assigned", json!({
            "booking_id": BOOKING,
            "driver": { "id": "D-7", "name": "Ravi", "vehicleNumber": "KA 01 AB 1234", "rating": 4.8 },
            "polyline": "_p~iF~ps|U_ulLnnqC_mqNvxq`@"
        })),
        ("driver-location", json!({ "booking_id": BOOKING, "lat": 12.9602, "lng": 77.6412, "heading": 310 })),
        ("driver-location", json!({ "booking_id": BOOKING, "lat": 12.9711, "lng": 77.6150, "heading": 295 })),
        ("driver-location", json!({ "booking_id": "BK-0999", "lat": 1.0, "lng": 1.0 })),
        ("pickup-confirmed", json!({ "booking_id": BOOKING })),
        ("driver-location", json!({ "booking_id": BOOKING, "lat": "13.0500", "lng": "77.6500" })),
        ("booking-halted", json!({ "booking_id": BOOKING })),
        ("halt-resumed", json!({ "booking_id": BOOKING })),
        ("driver-location", json!({ "booking_id": BOOKING, "lat": 13.1800 })),
        ("drop-confirmed", json!({ "booking_id": BOOKING })),
    ];

    let span = tracing::info_span!("ride", booking_id = BOOKING);
    async {
        for (kind, payload) in script {
            system
                .client
                .deliver(ChannelMessage::new(channel.clone(), kind, payload))
                .await
                .map_err(|e| e.to_string())?;
        }
        system
            .client
            .rate(BOOKING.into())
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;

    let snapshot = system.client.snapshot().await.map_err(|e| e.to_string())?;
    info!(
        status = ?snapshot.booking.as_ref().map(|b| b.status),
        rated = snapshot.booking.as_ref().is_some_and(|b| b.rated),
        route_points = snapshot.booking.as_ref().map_or(0, |b| b.route.len()),
        "Final snapshot"
    );

    let reasons = system
        .client
        .cancellation_reasons()
        .await
        .map_err(|e| e.to_string())?;
    info!(count = reasons.len(), "Cancellation reasons");

    system.shutdown().await
}
