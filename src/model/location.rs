//! Geographic coordinates and driver location samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
///
/// The `(0, 0)` value is the [`Coordinate::SENTINEL`]: it means "no location fix yet"
/// and is never treated as a real position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lon")]
    pub lng: f64,
}

impl Coordinate {
    /// Placeholder meaning "no fix".
    pub const SENTINEL: Self = Self { lat: 0.0, lng: 0.0 };

    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_sentinel(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }

    /// Finite and inside the ±90 / ±180 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// The latest known position of the assigned driver.
///
/// Samples are ephemeral: each one replaces the previous sample for the active
/// booking and no history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverLocationSample {
    pub coordinate: Coordinate,
    /// Degrees clockwise from north, in `[0, 360)`.
    pub heading: f64,
    pub vehicle_id: String,
    pub sampled_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_origin_only() {
        assert!(Coordinate::SENTINEL.is_sentinel());
        assert!(Coordinate::default().is_sentinel());
        assert!(!Coordinate::new(0.0, 12.5).is_sentinel());
        assert!(!Coordinate::new(-0.0001, 0.0).is_sentinel());
    }

    #[test]
    fn validity_checks_ranges_and_nan() {
        assert!(Coordinate::new(90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.5, 10.0).is_valid());
        assert!(!Coordinate::new(10.0, 181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 10.0).is_valid());
    }
}
