//! Coordinates and great-circle distance.
//!
//! Distances use the haversine formula on a spherical Earth with the mean
//! radius. Accuracy is ~0.5% which is plenty for "how far is the mosque".

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("coordinate is not a finite number (lat={lat}, lng={lng})")]
    NotFinite { lat: f64, lng: f64 },
    #[error("latitude {0} out of range (-90..90)")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} out of range (-180..180)")]
    LongitudeOutOfRange(f64),
}

impl Coordinate {
    /// Build a validated coordinate.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateError::NotFinite { lat, lng });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Re-check a coordinate that arrived through deserialization.
    pub fn validate(self) -> Result<Self, CoordinateError> {
        Self::new(self.lat, self.lng)
    }
}

/// Great-circle distance between two coordinates, in meters.
///
/// Symmetric, zero for identical points and never negative. The haversine
/// term is clamped into [0, 1] because rounding can push it just past 1 for
/// antipodal inputs, which would turn `sqrt(1 - h)` into NaN.
pub fn haversine_meters(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Human-readable distance: "850 m" below one kilometre, "1.2 km" above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0} m", meters)
    } else if meters < 100_000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{:.0} km", meters / 1000.0)
    }
}

/// "21.4225°N, 39.8262°E"
pub fn format_coords(coord: Coordinate) -> String {
    let ns = if coord.lat >= 0.0 { 'N' } else { 'S' };
    let ew = if coord.lng >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}\u{00B0}{}, {:.4}\u{00B0}{}", coord.lat.abs(), ns, coord.lng.abs(), ew)
}
