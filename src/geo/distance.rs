//! # Distance & ETA
//!
//! Haversine distance on a spherical Earth, a constant-speed ETA, and the
//! human-readable rendering shown next to the driver marker.
//!
//! Positions equal to [`Coordinate::SENTINEL`] mean "no fix yet". The
//! [`EtaEstimator`] refuses to compute anything from them instead of reporting a
//! bogus zero distance.

use crate::model::Coordinate;
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two coordinates.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Seconds needed to cover `meters` at `average_speed_kph`, rounded to the nearest second.
///
/// Non-positive speeds and distances yield zero.
pub fn eta_seconds(meters: f64, average_speed_kph: f64) -> i64 {
    if !(meters > 0.0 && average_speed_kph > 0.0) || !meters.is_finite() {
        return 0;
    }
    (meters / 1000.0 / average_speed_kph * 3600.0).round() as i64
}

/// Renders an ETA: `"H hours M minutes"`, `"M minutes"`, `"S seconds"`, or `""` for zero or less.
pub fn format_eta(seconds: i64) -> String {
    match seconds {
        s if s >= 3600 => format!("{} hours {} minutes", s / 3600, (s % 3600) / 60),
        s if s >= 60 => format!("{} minutes", s / 60),
        s if s > 0 => format!("{s} seconds"),
        _ => String::new(),
    }
}

/// A computed distance with its ETA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceEta {
    pub meters: f64,
    pub seconds: i64,
    pub text: String,
}

/// Turns a driver position and a target into a [`DistanceEta`].
#[derive(Debug, Clone, Copy)]
pub struct EtaEstimator {
    average_speed_kph: f64,
}

impl EtaEstimator {
    pub fn new(average_speed_kph: f64) -> Self {
        Self { average_speed_kph }
    }

    /// Returns `None` when either side is the sentinel coordinate.
    pub fn estimate(&self, from: Coordinate, to: Coordinate) -> Option<DistanceEta> {
        if from.is_sentinel() || to.is_sentinel() {
            return None;
        }
        let meters = distance(from, to);
        let seconds = eta_seconds(meters, self.average_speed_kph);
        Some(DistanceEta {
            meters,
            seconds,
            text: format_eta(seconds),
        })
    }
}
