mod common;

use chrono::{Duration, Utc};
use common::{booking, Harness};
use ride_tracker::model::{BookingId, BookingStatus};
use serde_json::json;

/// A late event from the previous ride must not touch the new one.
#[tokio::test]
async fn test_late_event_from_previous_booking_is_ignored() {
    let h = Harness::start();
    h.follow(booking("old").with_status(BookingStatus::Allocated)).await;
    h.client.track(booking("new")).await.unwrap();

    h.deliver("driver-assigned", json!({ "booking_id": "old", "driver": { "id": "d1" } })).await;
    h.deliver("auto-cancelled", json!({ "booking_id": "old" })).await;
    h.deliver("driver-location", json!({ "booking_id": "old", "lat": 12.96, "lng": 77.64 })).await;

    let snapshot = h.snapshot().await;
    let record = snapshot.booking.unwrap();
    assert_eq!(record.booking_id, BookingId::new("new"));
    assert_eq!(record.status, BookingStatus::Initiated);
    assert!(record.driver.is_none());
    assert!(snapshot.last_sample.is_none());
    assert_eq!(snapshot.watchdog_armed_for, Some(BookingId::new("new")));
    assert!(h.listener.eta_texts().is_empty());
}

#[tokio::test]
async fn test_missing_booking_id_never_matches() {
    let h = Harness::start();
    h.follow(booking("b1")).await;

    h.deliver("driver-assigned", json!({ "driver": { "id": "d1" } })).await;
    h.deliver("auto-cancelled", json!({ "booking_id": "" })).await;

    assert_eq!(h.snapshot().await.booking.unwrap().status, BookingStatus::Initiated);
}

#[tokio::test]
async fn test_invalid_payloads_are_dropped_and_tracking_continues() {
    let h = Harness::start();
    h.follow(booking("b1").with_status(BookingStatus::Allocated)).await;

    h.deliver("driver-location", json!({ "booking_id": "b1", "lat": 12.97 })).await;
    h.deliver("driver-location", json!({ "booking_id": "b1", "lat": "north", "lng": 77.6 })).await;
    h.deliver("driver-location", json!({ "booking_id": "b1", "lat": 95.0, "lng": 77.6 })).await;
    h.deliver("driver-teleported", json!({ "booking_id": "b1" })).await;
    h.deliver("pickup-confirmed", json!("not an object")).await;
    assert!(h.snapshot().await.last_sample.is_none());

    h.deliver("pickup-confirmed", json!({ "booking_id": "b1" })).await;
    assert_eq!(h.snapshot().await.booking.unwrap().status, BookingStatus::PickedUp);
}

#[tokio::test]
async fn test_sentinel_location_produces_no_eta() {
    let h = Harness::start();
    h.follow(booking("b1").with_status(BookingStatus::Allocated)).await;

    h.deliver("driver-location", json!({ "booking_id": "b1", "lat": 0, "lng": 0 })).await;

    let snapshot = h.snapshot().await;
    assert!(snapshot.last_sample.is_some());
    assert!(snapshot.eta.is_none());
    assert!(h.listener.eta_texts().is_empty());
}

/// Losing the fix after a real sample withdraws the published ETA.
#[tokio::test]
async fn test_sentinel_after_fix_clears_eta() {
    let h = Harness::start();
    h.follow(booking("b1").with_status(BookingStatus::Allocated)).await;

    h.deliver("driver-location", json!({ "booking_id": "b1", "lat": 12.9711, "lng": 77.6150 })).await;
    assert!(h.snapshot().await.eta.is_some());

    h.deliver("driver-location", json!({ "booking_id": "b1", "lat": 0, "lng": 0 })).await;

    let snapshot = h.snapshot().await;
    assert!(snapshot.last_sample.unwrap().coordinate.is_sentinel());
    assert!(snapshot.eta.is_none());
    assert_eq!(h.listener.eta_texts(), vec!["2 minutes".to_string(), String::new()]);
}

#[tokio::test]
async fn test_redelivered_events_are_idempotent() {
    let h = Harness::start();
    h.follow(booking("b1")).await;

    let assigned = json!({ "booking_id": "b1", "driver": { "id": "d1", "name": "Ravi" } });
    h.deliver("driver-assigned", assigned.clone()).await;
    h.deliver("driver-assigned", assigned).await;
    h.deliver("pickup-confirmed", json!({ "booking_id": "b1" })).await;
    h.deliver("pickup-confirmed", json!({ "booking_id": "b1" })).await;
    h.deliver("drop-confirmed", json!({ "booking_id": "b1" })).await;
    h.deliver("drop-confirmed", json!({ "booking_id": "b1" })).await;
    h.deliver("booking-cancelled-by-driver", json!({ "booking_id": "b1" })).await;

    assert_eq!(
        h.listener.statuses(),
        vec![
            BookingStatus::Initiated,
            BookingStatus::Allocated,
            BookingStatus::PickedUp,
            BookingStatus::Delivered,
        ]
    );
}

/// Delivery is unordered: the last processed sample wins, not the newest timestamp.
#[tokio::test]
async fn test_out_of_order_locations_keep_last_processed_sample() {
    let h = Harness::start();
    h.follow(booking("b1").with_status(BookingStatus::Allocated)).await;

    let now = Utc::now();
    let newer = (now - Duration::seconds(5)).timestamp_millis();
    let older = (now - Duration::seconds(30)).timestamp_millis();

    h.deliver(
        "driver-location",
        json!({ "booking_id": "b1", "lat": 12.9711, "lng": 77.6150, "sampled_at": newer }),
    )
    .await;
    h.deliver(
        "driver-location",
        json!({ "booking_id": "b1", "lat": 12.9602, "lng": 77.6412, "sampled_at": older }),
    )
    .await;

    let snapshot = h.snapshot().await;
    let sample = snapshot.last_sample.unwrap();
    assert_eq!(sample.sampled_at.timestamp_millis(), older);
    assert_eq!(sample.coordinate.lat, 12.9602);
    assert_eq!(snapshot.eta.unwrap().text, "8 minutes");
    assert_eq!(h.listener.eta_texts(), vec!["2 minutes", "8 minutes"]);
}
