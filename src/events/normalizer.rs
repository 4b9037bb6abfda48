//! # Event Normalizer
//!
//! Converts a raw `(kind, JSON payload)` pair from the push channel into a typed
//! [`DomainEvent`]. Payloads are lenient where the field is optional and strict
//! where it is required:
//!
//! - a missing booking id becomes the empty [`BookingId`], which never matches a tracked booking
//! - ids may arrive as strings or numbers
//! - coordinates may arrive as numbers or numeric strings, but must be present and in range
//! - everything else has an explicit default
//!
//! Anything that cannot be normalized comes back as an [`InvalidEvent`] value.

use super::kind::EventKind;
use crate::model::{BookingId, Coordinate, DriverAssignment, DriverLocationSample};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// A push notification after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    DriverAssigned {
        booking_id: BookingId,
        driver: DriverAssignment,
        /// Encoded polyline of the planned route, if the server sent one.
        route: Option<String>,
    },
    DriverLocation {
        booking_id: BookingId,
        sample: DriverLocationSample,
    },
    PickupConfirmed {
        booking_id: BookingId,
        route: Option<String>,
    },
    DropConfirmed {
        booking_id: BookingId,
    },
    BookingCancelledByDriver {
        booking_id: BookingId,
        reason: Option<String>,
    },
    PaymentFailed {
        booking_id: BookingId,
        message: Option<String>,
    },
    AutoCancelled {
        booking_id: BookingId,
    },
    HaltResumed {
        booking_id: BookingId,
    },
    BookingHalted {
        booking_id: BookingId,
    },
    LookingForNewDriver {
        booking_id: BookingId,
    },
}

impl DomainEvent {
    pub fn booking_id(&self) -> &BookingId {
        match self {
            Self::DriverAssigned { booking_id, .. }
            | Self::DriverLocation { booking_id, .. }
            | Self::PickupConfirmed { booking_id, .. }
            | Self::DropConfirmed { booking_id }
            | Self::BookingCancelledByDriver { booking_id, .. }
            | Self::PaymentFailed { booking_id, .. }
            | Self::AutoCancelled { booking_id }
            | Self::HaltResumed { booking_id }
            | Self::BookingHalted { booking_id }
            | Self::LookingForNewDriver { booking_id } => booking_id,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::DriverAssigned { .. } => EventKind::DriverAssigned,
            Self::DriverLocation { .. } => EventKind::DriverLocation,
            Self::PickupConfirmed { .. } => EventKind::PickupConfirmed,
            Self::DropConfirmed { .. } => EventKind::DropConfirmed,
            Self::BookingCancelledByDriver { .. } => EventKind::BookingCancelledByDriver,
            Self::PaymentFailed { .. } => EventKind::PaymentFailed,
            Self::AutoCancelled { .. } => EventKind::AutoCancelled,
            Self::HaltResumed { .. } => EventKind::HaltResumed,
            Self::BookingHalted { .. } => EventKind::BookingHalted,
            Self::LookingForNewDriver { .. } => EventKind::LookingForNewDriver,
        }
    }
}

/// Why a raw message could not become a [`DomainEvent`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidEvent {
    #[error("unrecognized event kind {0:?}")]
    UnknownKind(String),
    #[error("malformed {kind} payload: {reason}")]
    Malformed { kind: EventKind, reason: String },
    #[error("{kind} payload is missing {field}")]
    MissingField { kind: EventKind, field: &'static str },
    #[error("{kind} payload has a non-numeric {field}")]
    NonNumeric { kind: EventKind, field: &'static str },
    #[error("{kind} payload has an out-of-range coordinate ({lat}, {lng})")]
    OutOfRange { kind: EventKind, lat: f64, lng: f64 },
}

/// Normalizes one raw channel message.
pub fn normalize(raw_kind: &str, payload: &Value) -> Result<DomainEvent, InvalidEvent> {
    let kind = EventKind::from_wire(raw_kind)
        .ok_or_else(|| InvalidEvent::UnknownKind(raw_kind.to_string()))?;

    let event = match kind {
        EventKind::DriverAssigned => {
            let raw: DriverAssignedPayload = parse(kind, payload)?;
            let driver = raw.driver.ok_or(InvalidEvent::MissingField { kind, field: "driver" })?;
            DomainEvent::DriverAssigned {
                booking_id: booking_id(raw.booking_id),
                driver: driver.into_assignment(),
                route: non_empty(raw.route),
            }
        }
        EventKind::DriverLocation => {
            let raw: DriverLocationPayload = parse(kind, payload)?;
            let lat = required_number(kind, "latitude", raw.latitude)?;
            let lng = required_number(kind, "longitude", raw.longitude)?;
            let coordinate = Coordinate::new(lat, lng);
            if !coordinate.is_valid() {
                return Err(InvalidEvent::OutOfRange { kind, lat, lng });
            }
            let heading = raw
                .heading
                .as_ref()
                .and_then(Scalar::as_f64)
                .unwrap_or(0.0)
                .rem_euclid(360.0);
            let sampled_at = raw
                .sampled_at
                .as_ref()
                .and_then(Scalar::as_timestamp)
                .unwrap_or_else(Utc::now);
            DomainEvent::DriverLocation {
                booking_id: booking_id(raw.booking_id),
                sample: DriverLocationSample {
                    coordinate,
                    heading,
                    vehicle_id: raw.vehicle_id.map(Scalar::into_text).unwrap_or_default(),
                    sampled_at,
                },
            }
        }
        EventKind::PickupConfirmed => {
            let raw: RoutePayload = parse(kind, payload)?;
            DomainEvent::PickupConfirmed {
                booking_id: booking_id(raw.booking_id),
                route: non_empty(raw.route),
            }
        }
        EventKind::BookingCancelledByDriver => {
            let raw: MessagePayload = parse(kind, payload)?;
            DomainEvent::BookingCancelledByDriver {
                booking_id: booking_id(raw.booking_id),
                reason: non_empty(raw.message),
            }
        }
        EventKind::PaymentFailed => {
            let raw: MessagePayload = parse(kind, payload)?;
            DomainEvent::PaymentFailed {
                booking_id: booking_id(raw.booking_id),
                message: non_empty(raw.message),
            }
        }
        EventKind::DropConfirmed => DomainEvent::DropConfirmed {
            booking_id: booking_id(parse::<BookingRef>(kind, payload)?.booking_id),
        },
        EventKind::AutoCancelled => DomainEvent::AutoCancelled {
            booking_id: booking_id(parse::<BookingRef>(kind, payload)?.booking_id),
        },
        EventKind::HaltResumed => DomainEvent::HaltResumed {
            booking_id: booking_id(parse::<BookingRef>(kind, payload)?.booking_id),
        },
        EventKind::BookingHalted => DomainEvent::BookingHalted {
            booking_id: booking_id(parse::<BookingRef>(kind, payload)?.booking_id),
        },
        EventKind::LookingForNewDriver => DomainEvent::LookingForNewDriver {
            booking_id: booking_id(parse::<BookingRef>(kind, payload)?.booking_id),
        },
    };

    Ok(event)
}

fn parse<'a, T: Deserialize<'a>>(kind: EventKind, payload: &'a Value) -> Result<T, InvalidEvent> {
    T::deserialize(payload).map_err(|e| InvalidEvent::Malformed {
        kind,
        reason: e.to_string(),
    })
}

fn booking_id(raw: Option<Scalar>) -> BookingId {
    raw.map(|id| BookingId::new(id.into_text())).unwrap_or_default()
}

fn required_number(
    kind: EventKind,
    field: &'static str,
    raw: Option<Scalar>,
) -> Result<f64, InvalidEvent> {
    let raw = raw.ok_or(InvalidEvent::MissingField { kind, field })?;
    raw.as_f64().ok_or(InvalidEvent::NonNumeric { kind, field })
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

// =============================================================================
// Wire payloads
// =============================================================================

/// A JSON scalar that may carry a number either natively or as text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl Scalar {
    fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Integer(n) => *n as f64,
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    fn into_text(self) -> String {
        match self {
            Self::Integer(n) => n.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }

    /// Epoch milliseconds or RFC 3339.
    fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Integer(ms) => DateTime::from_timestamp_millis(*ms),
            Self::Number(ms) => DateTime::from_timestamp_millis(*ms as i64),
            Self::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|t| t.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BookingRef {
    #[serde(alias = "bookingId")]
    booking_id: Option<Scalar>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RoutePayload {
    #[serde(alias = "bookingId")]
    booking_id: Option<Scalar>,
    #[serde(alias = "polyline")]
    route: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MessagePayload {
    #[serde(alias = "bookingId")]
    booking_id: Option<Scalar>,
    #[serde(alias = "reason")]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DriverAssignedPayload {
    #[serde(alias = "bookingId")]
    booking_id: Option<Scalar>,
    driver: Option<DriverPayload>,
    #[serde(alias = "polyline")]
    route: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DriverPayload {
    #[serde(alias = "driverId", alias = "driver_id")]
    id: Option<Scalar>,
    name: Option<String>,
    #[serde(alias = "mobile")]
    phone: Option<String>,
    #[serde(alias = "vehicleId")]
    vehicle_id: Option<Scalar>,
    #[serde(alias = "vehicleNumber")]
    vehicle_number: Option<String>,
    rating: Option<Scalar>,
}

impl DriverPayload {
    fn into_assignment(self) -> DriverAssignment {
        DriverAssignment {
            driver_id: self.id.map(Scalar::into_text).unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            phone: non_empty(self.phone),
            vehicle_id: self.vehicle_id.map(Scalar::into_text).unwrap_or_default(),
            vehicle_number: non_empty(self.vehicle_number),
            rating: self.rating.as_ref().and_then(Scalar::as_f64),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DriverLocationPayload {
    #[serde(alias = "bookingId")]
    booking_id: Option<Scalar>,
    #[serde(alias = "lat")]
    latitude: Option<Scalar>,
    #[serde(alias = "lng", alias = "lon")]
    longitude: Option<Scalar>,
    #[serde(alias = "bearing")]
    heading: Option<Scalar>,
    #[serde(alias = "vehicleId")]
    vehicle_id: Option<Scalar>,
    #[serde(alias = "sampledAt", alias = "timestamp")]
    sampled_at: Option<Scalar>,
}
