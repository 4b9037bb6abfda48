//! Geospatial math: great-circle distance, ETA text and route polylines.

pub mod distance;
pub mod polyline;

pub use distance::*;
pub use polyline::{decode, decode_with_precision, encode, encode_with_precision, PolylineError};
