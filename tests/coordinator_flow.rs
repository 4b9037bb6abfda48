mod common;

use common::{booking, Harness, CHANNEL, CUSTOMER, ROUTE};
use ride_tracker::channel::InMemoryTransport;
use ride_tracker::clients::{ServiceError, StaticBookingService};
use ride_tracker::coordinator::{TrackerError, TrackingContext};
use ride_tracker::lifecycle::{LifecycleError, Notice};
use ride_tracker::mock::{ListenerEvent, RecordingListener};
use ride_tracker::model::{BookingId, BookingStatus, CancellationReason};
use ride_tracker::runtime::{TrackerConfig, TrackerSystem};
use serde_json::json;
use std::sync::Arc;

/// Full ride: search, assignment, approach, pickup, halt, resume, drop, rating.
#[tokio::test]
async fn test_full_ride_lifecycle() {
    let h = Harness::start();
    let resumed = h.activate_with(vec![booking("b1")]).await;
    assert_eq!(resumed, Some(BookingId::new("b1")));
    assert_eq!(h.snapshot().await.watchdog_armed_for, Some(BookingId::new("b1")));

    h.deliver(
        "driver-assigned",
        json!({ "booking_id": "b1", "driver": { "id": "d7", "name": "Ravi" }, "polyline": ROUTE }),
    )
    .await;
    let snapshot = h.snapshot().await;
    let record = snapshot.booking.clone().unwrap();
    assert_eq!(record.status, BookingStatus::Allocated);
    assert_eq!(record.driver.unwrap().driver_id, "d7");
    assert_eq!(record.route.len(), 3);
    assert!(snapshot.watchdog_armed_for.is_none());

    h.deliver("driver-location", json!({ "booking_id": "b1", "lat": 12.9602, "lng": 77.6412 })).await;
    h.deliver("driver-location", json!({ "booking_id": "b1", "lat": 12.9711, "lng": 77.6150 })).await;
    h.deliver("pickup-confirmed", json!({ "booking_id": "b1" })).await;
    h.deliver("driver-location", json!({ "booking_id": "b1", "lat": 13.05, "lng": 77.65 })).await;
    h.deliver("booking-halted", json!({ "booking_id": "b1" })).await;
    assert_eq!(h.snapshot().await.booking.unwrap().status, BookingStatus::Halted);
    h.deliver("halt-resumed", json!({ "booking_id": "b1" })).await;
    h.deliver("driver-location", json!({ "booking_id": "b1", "lat": 13.18, "lng": 77.70 })).await;
    h.deliver("drop-confirmed", json!({ "booking_id": "b1" })).await;

    h.client.rate("b1".into()).await.unwrap();
    let err = h.client.rate("b1".into()).await.unwrap_err();
    assert_eq!(err, TrackerError::Lifecycle(LifecycleError::AlreadyRated("b1".into())));

    let snapshot = h.snapshot().await;
    let record = snapshot.booking.unwrap();
    assert_eq!(record.status, BookingStatus::Delivered);
    assert!(record.rated);
    assert!(snapshot.eta.is_none());

    assert_eq!(
        h.listener.statuses(),
        vec![
            BookingStatus::Initiated,
            BookingStatus::Allocated,
            BookingStatus::PickedUp,
            BookingStatus::Halted,
            BookingStatus::PickedUp,
            BookingStatus::Delivered,
            BookingStatus::Delivered,
        ]
    );
    assert_eq!(
        h.listener.eta_texts(),
        vec!["8 minutes", "2 minutes", "", "54 minutes", "35 minutes", "4 minutes", ""]
    );
    assert_eq!(
        h.listener.notices(),
        vec![Notice::Halted, Notice::Resumed, Notice::Delivered]
    );
    assert!(h.listener.events().contains(&ListenerEvent::RouteUpdated {
        booking_id: "b1".into(),
        points: 3
    }));
    assert!(h.listener.watchdog_fired().is_empty());
    h.service.verify();
}

#[tokio::test]
async fn test_location_updates_snapshot_eta() {
    let h = Harness::start();
    h.follow(booking("b1").with_status(BookingStatus::Allocated)).await;

    h.deliver(
        "driver-location",
        json!({ "booking_id": "b1", "lat": 12.9711, "lng": 77.6150, "heading": 400, "vehicle_id": "KA-01" }),
    )
    .await;

    let snapshot = h.snapshot().await;
    let sample = snapshot.last_sample.unwrap();
    assert_eq!(sample.heading, 40.0);
    assert_eq!(sample.vehicle_id, "KA-01");
    let eta = snapshot.eta.unwrap();
    assert!((eta.meters - 1038.7).abs() < 1.0);
    assert_eq!(eta.text, "2 minutes");
}

#[tokio::test]
async fn test_bad_route_still_applies_assignment() {
    let h = Harness::start();
    h.follow(booking("b1")).await;

    h.deliver(
        "driver-assigned",
        json!({ "booking_id": "b1", "driver": { "id": "d7" }, "route": "not a polyline" }),
    )
    .await;

    let record = h.snapshot().await.booking.unwrap();
    assert_eq!(record.status, BookingStatus::Allocated);
    assert!(record.route.is_empty());
}

/// A route whose running sum overflows is rejected and the tracker keeps going.
#[tokio::test]
async fn test_overflowing_route_does_not_stop_the_tracker() {
    let h = Harness::start();
    h.follow(booking("b1")).await;

    let route = "~~~~~~~~~~~^?".repeat(40);
    h.deliver(
        "driver-assigned",
        json!({ "booking_id": "b1", "driver": { "id": "d7" }, "route": route }),
    )
    .await;
    h.deliver("pickup-confirmed", json!({ "booking_id": "b1", "route": ROUTE })).await;

    let record = h.snapshot().await.booking.unwrap();
    assert_eq!(record.status, BookingStatus::PickedUp);
    assert_eq!(record.route.len(), 3);
    assert!(!h.handle.is_finished());
}

#[tokio::test]
async fn test_payment_failure_is_reported_after_delivery() {
    let h = Harness::start();
    h.follow(booking("b1").with_status(BookingStatus::Delivered)).await;

    h.deliver("payment-failed", json!({ "bookingId": "b1", "message": "card declined" })).await;
    h.deliver("driver-location", json!({ "booking_id": "b1", "lat": 13.0, "lng": 77.6 })).await;

    assert_eq!(
        h.listener.notices(),
        vec![Notice::PaymentFailed {
            message: Some("card declined".into())
        }]
    );
    assert!(h.listener.eta_texts().is_empty());
}

#[tokio::test]
async fn test_cancellation_reasons_proxy() {
    let h = Harness::start();
    let reasons = vec![CancellationReason {
        id: "late".into(),
        label: "Driver is late".into(),
    }];
    h.service.expect_fetch_cancellation_reasons().return_ok(reasons.clone());
    h.service
        .expect_fetch_cancellation_reasons()
        .return_err(ServiceError::Unavailable("timeout".into()));

    assert_eq!(h.client.cancellation_reasons().await.unwrap(), reasons);
    let err = h.client.cancellation_reasons().await.unwrap_err();
    assert!(matches!(err, TrackerError::Service(ServiceError::Unavailable(_))));
    assert!(err.is_retryable());
    h.service.verify();
}

#[tokio::test]
async fn test_track_rejects_empty_booking_id() {
    let h = Harness::start();
    let err = h.client.track(booking("")).await.unwrap_err();
    assert_eq!(err, TrackerError::EmptyBookingId);
}

#[tokio::test]
async fn test_rate_requires_tracked_delivered_booking() {
    let h = Harness::start();
    h.follow(booking("b1").with_status(BookingStatus::PickedUp)).await;

    assert_eq!(
        h.client.rate("b2".into()).await,
        Err(TrackerError::NotTracked("b2".into()))
    );
    assert!(matches!(
        h.client.rate("b1".into()).await,
        Err(TrackerError::Lifecycle(LifecycleError::NotDelivered { .. }))
    ));
}

#[tokio::test]
async fn test_dispose_releases_everything_and_rejects_later_calls() {
    let h = Harness::start();
    h.activate_with(vec![booking("b1")]).await;

    h.client.dispose().await.unwrap();
    h.client.dispose().await.unwrap();

    let snapshot = h.snapshot().await;
    assert!(snapshot.disposed);
    assert!(snapshot.booking.is_none());
    assert!(snapshot.channel.is_none());
    assert!(snapshot.watchdog_armed_for.is_none());
    assert!(!h.transport.is_connected(CHANNEL));
    assert!(h.transport.bound_kinds(CHANNEL).is_empty());

    assert_eq!(h.client.track(booking("b2")).await, Err(TrackerError::Disposed));
    assert_eq!(h.client.activate(CUSTOMER).await, Err(TrackerError::Disposed));
    assert_eq!(h.client.deactivate().await, Err(TrackerError::Disposed));
    assert_eq!(h.client.cancellation_reasons().await, Err(TrackerError::Disposed));
    let late = ride_tracker::channel::ChannelMessage::new(CHANNEL, "auto-cancelled", json!({ "booking_id": "b1" }));
    assert_eq!(h.client.deliver(late).await, Err(TrackerError::Disposed));
}

#[tokio::test]
async fn test_actor_stops_when_clients_are_dropped() {
    let h = Harness::start();
    h.activate_with(Vec::new()).await;
    assert!(h.transport.is_connected(CHANNEL));

    drop(h.client);
    h.handle.await.unwrap();

    assert!(!h.transport.is_connected(CHANNEL));
}

#[tokio::test]
async fn test_tracker_system_shutdown() {
    let transport = Arc::new(InMemoryTransport::new());
    let context = TrackingContext::new(
        transport.clone(),
        Arc::new(StaticBookingService::new(vec![booking("b1")], Vec::new())),
        Arc::new(RecordingListener::new()),
    );
    let system = TrackerSystem::new(TrackerConfig::default(), context);

    let resumed = system.client.activate(CUSTOMER).await.unwrap();
    assert_eq!(resumed, Some("b1".into()));
    assert!(transport.is_connected(CHANNEL));

    system.shutdown().await.unwrap();
    assert!(!transport.is_connected(CHANNEL));
}
