//! Geographic coordinates and great-circle distance.
//!
//! The geo gate compares the client's position fix against the vault's
//! configured geofence center using the Haversine formula:
//!
//! ```text
//! a = sin²(Δφ/2) + cos(φ1)·cos(φ2)·sin²(Δλ/2)
//! c = 2·atan2(√a, √(1-a))
//! distance = R · c
//! ```
//!
//! with latitudes/longitudes converted from degrees to radians and
//! R = 6,371,000 meters (mean Earth radius).

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};

/// Mean Earth radius in meters, as used by the Haversine distance.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees, -90.0 ..= 90.0.
    pub lat: f64,

    /// Longitude in decimal degrees, -180.0 ..= 180.0.
    pub lng: f64,
}

impl Coordinates {
    /// Create a coordinate pair without validation.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that both components are finite and within WGS84 range.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidInput`] for NaN, infinite, or
    /// out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(AccessError::InvalidInput {
                reason: "coordinates must be finite numbers".into(),
            });
        }
        if self.lat < -90.0 || self.lat > 90.0 {
            return Err(AccessError::InvalidInput {
                reason: format!("latitude {} out of range [-90, 90]", self.lat),
            });
        }
        if self.lng < -180.0 || self.lng > 180.0 {
            return Err(AccessError::InvalidInput {
                reason: format!("longitude {} out of range [-180, 180]", self.lng),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Great-circle distance in meters between two points via Haversine.
pub fn haversine_distance_meters(a: Coordinates, b: Coordinates) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_phi = (b.lat - a.lat).to_radians();
    let delta_lambda = (b.lng - a.lng).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let p = Coordinates::new(40.0, -73.0);
        assert_eq!(haversine_distance_meters(p, p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinates::new(51.5074, -0.1278); // London
        let b = Coordinates::new(48.8566, 2.3522); // Paris
        let ab = haversine_distance_meters(a, b);
        let ba = haversine_distance_meters(b, a);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn half_kilometer_latitude_offset() {
        // 0.0045° of latitude is roughly 500 m anywhere on Earth.
        let a = Coordinates::new(40.0, -73.0);
        let b = Coordinates::new(40.0045, -73.0);
        let d = haversine_distance_meters(a, b);
        assert!((d - 500.0).abs() < 5.0, "distance was {d}");
    }

    #[test]
    fn london_to_paris_plausible() {
        let a = Coordinates::new(51.5074, -0.1278);
        let b = Coordinates::new(48.8566, 2.3522);
        let d = haversine_distance_meters(a, b);
        // Roughly 343 km in reality.
        assert!(d > 330_000.0 && d < 360_000.0, "distance was {d}");
    }

    #[test]
    fn validate_accepts_normal_coordinates() {
        assert!(Coordinates::new(40.0, -73.0).validate().is_ok());
        assert!(Coordinates::new(-90.0, 180.0).validate().is_ok());
    }

    #[test]
    fn validate_rejects_nan_and_out_of_range() {
        assert!(Coordinates::new(f64::NAN, 0.0).validate().is_err());
        assert!(Coordinates::new(0.0, f64::INFINITY).validate().is_err());
        assert!(Coordinates::new(91.0, 0.0).validate().is_err());
        assert!(Coordinates::new(0.0, -181.0).validate().is_err());
    }
}
