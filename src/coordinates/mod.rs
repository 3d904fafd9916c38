//! Fixed-point latitude/longitude codec
//!
//! The review contract has no decimal type, so coordinates are stored as
//! scaled integers. Records written by the current client use 10^6; early
//! records used 10^4. Nothing on-chain says which scale a record uses, so
//! decoding sniffs the magnitude of each value independently.

/// Scale used for everything this client writes
pub const SCALE: f64 = 1_000_000.0;

/// Scale of records written before the precision upgrade
pub const LEGACY_SCALE: f64 = 10_000.0;

/// Scaled values at or below this magnitude are read as legacy records.
///
/// Any new-format coordinate within 0.1 degrees of zero falls under it and
/// is misread. A per-record format field would remove the guess.
pub const LEGACY_THRESHOLD: i64 = 100_000;

/// Decimal places kept for display and storage
pub const PRECISION: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateScale {
    Micro,
    Legacy,
}

impl CoordinateScale {
    pub fn detect(raw: i64) -> Self {
        if raw.unsigned_abs() > LEGACY_THRESHOLD as u64 {
            CoordinateScale::Micro
        } else {
            CoordinateScale::Legacy
        }
    }

    pub fn divisor(&self) -> f64 {
        match self {
            CoordinateScale::Micro => SCALE,
            CoordinateScale::Legacy => LEGACY_SCALE,
        }
    }
}

/// Round to `places` decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Scale a single coordinate for storage.
///
/// The value is first rounded to six places, so its scaled form sits within
/// float error of a whole number; rounding that product yields the same
/// integer as truncating the exact decimal.
pub fn encode_value(value: f64) -> i64 {
    let scaled = round_to(value, PRECISION) * SCALE;
    scaled.round() as i64
}

/// Decode a single stored coordinate, choosing the divisor from its magnitude
pub fn decode_value(raw: i64) -> f64 {
    let scale = CoordinateScale::detect(raw);
    round_to(raw as f64 / scale.divisor(), PRECISION)
}

pub fn encode(lat: f64, lng: f64) -> (i64, i64) {
    (encode_value(lat), encode_value(lng))
}

pub fn decode(lat: i64, lng: i64) -> (f64, f64) {
    (decode_value(lat), decode_value(lng))
}
