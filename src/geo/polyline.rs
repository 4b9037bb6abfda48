//! # Polyline Codec
//!
//! Decodes the printable-ASCII polyline format used for route geometry: each
//! scalar is a zig-zag encoded delta split into 5-bit groups, every group
//! offset by 63, with `0x20` as the continuation bit. Latitude and longitude
//! deltas alternate and are accumulated, then divided by the precision
//! (1e5 by default).
//!
//! [`encode`] is the inverse and exists so decoded routes can be checked
//! against a known encoder.

use crate::model::Coordinate;

/// Default precision: five decimal places.
pub const PRECISION: f64 = 1e5;

const OFFSET: u8 = 63;
const CONTINUATION: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolylineError {
    #[error("invalid polyline byte {byte:#04x} at offset {index}")]
    InvalidByte { index: usize, byte: u8 },
    #[error("polyline ends in the middle of a value at offset {0}")]
    Truncated(usize),
    #[error("polyline value starting at offset {0} overflows")]
    Overflow(usize),
}

/// Decodes at the default 1e5 precision.
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>, PolylineError> {
    decode_with_precision(encoded, PRECISION)
}

pub fn decode_with_precision(encoded: &str, precision: f64) -> Result<Vec<Coordinate>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut path = Vec::with_capacity(bytes.len() / 4);

    while index < bytes.len() {
        lat = accumulate(lat, bytes, &mut index)?;
        if index >= bytes.len() {
            // A latitude without its longitude.
            return Err(PolylineError::Truncated(index));
        }
        lng = accumulate(lng, bytes, &mut index)?;
        path.push(Coordinate::new(lat as f64 / precision, lng as f64 / precision));
    }

    Ok(path)
}

fn accumulate(total: i64, bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let start = *index;
    let delta = next_value(bytes, index)?;
    total.checked_add(delta).ok_or(PolylineError::Overflow(start))
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(PolylineError::Truncated(*index));
        };
        if !(OFFSET..=OFFSET + 63).contains(&byte) {
            return Err(PolylineError::InvalidByte { index: *index, byte });
        }
        if shift > 55 {
            return Err(PolylineError::Overflow(*index));
        }
        *index += 1;

        let chunk = i64::from(byte - OFFSET);
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;

        if chunk & CONTINUATION == 0 {
            break;
        }
    }

    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}

/// Encodes at the default 1e5 precision.
pub fn encode(path: &[Coordinate]) -> String {
    encode_with_precision(path, PRECISION)
}

pub fn encode_with_precision(path: &[Coordinate], precision: f64) -> String {
    let mut out = String::with_capacity(path.len() * 8);
    let (mut prev_lat, mut prev_lng) = (0i64, 0i64);

    for point in path {
        let lat = (point.lat * precision).round() as i64;
        let lng = (point.lng * precision).round() as i64;
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lng - prev_lng);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn push_value(out: &mut String, delta: i64) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while value >= CONTINUATION {
        out.push(char::from(((CONTINUATION | (value & CHUNK_MASK)) as u8) + OFFSET));
        value >>= 5;
    }
    out.push(char::from((value as u8) + OFFSET));
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    #[test]
    fn decodes_reference_path_exactly() {
        let path = decode(REFERENCE).unwrap();
        assert_eq!(
            path,
            vec![
                Coordinate::new(38.5, -120.2),
                Coordinate::new(40.7, -120.95),
                Coordinate::new(43.252, -126.453),
            ]
        );
    }

    #[test]
    fn encodes_reference_path() {
        let path = [
            Coordinate::new(38.5, -120.2),
            Coordinate::new(40.7, -120.95),
            Coordinate::new(43.252, -126.453),
        ];
        assert_eq!(encode(&path), REFERENCE);
    }

    #[test]
    fn empty_input_is_empty_path() {
        assert_eq!(decode("").unwrap(), Vec::<Coordinate>::new());
    }

    #[test]
    fn decodes_single_zero_point() {
        assert_eq!(decode("??").unwrap(), vec![Coordinate::new(0.0, 0.0)]);
    }

    #[test]
    fn rejects_bytes_outside_alphabet() {
        assert_eq!(
            decode("_p~iF ps|U"),
            Err(PolylineError::InvalidByte { index: 5, byte: b' ' })
        );
    }

    #[test]
    fn rejects_dangling_latitude() {
        assert_eq!(decode("_p~iF"), Err(PolylineError::Truncated(5)));
    }

    #[test]
    fn rejects_unterminated_value() {
        // '_' carries the continuation bit and nothing follows.
        assert_eq!(decode("_p~iF~ps|"), Err(PolylineError::Truncated(9)));
    }

    #[test]
    fn rejects_runaway_continuation() {
        let encoded = "~".repeat(20);
        assert!(matches!(decode(&encoded), Err(PolylineError::Overflow(_))));
    }

    #[test]
    fn rejects_accumulated_overflow() {
        // Each point adds roughly -2^59 to the latitude.
        let encoded = "~~~~~~~~~~~^?".repeat(40);
        assert!(matches!(decode(&encoded), Err(PolylineError::Overflow(_))));
    }

    #[test]
    fn honours_custom_precision() {
        let path = [Coordinate::new(12.971599, 77.594563)];
        let encoded = encode_with_precision(&path, 1e6);
        let decoded = decode_with_precision(&encoded, 1e6).unwrap();
        assert_eq!(decoded, path.to_vec());
    }
}
