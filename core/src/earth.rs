//! Earth-related constants and local-level frame conversions
//!
//! This module contains the constants and the small-angle coordinate conversions used to
//! compare two trajectories. Positions are carried as WGS84 geodetic coordinates (latitude and
//! longitude in radians, altitude in meters) and are projected onto a local-level North-East-Down
//! (NED) frame anchored at a single geodetic point.
//!
//! # Local-tangent-plane approximation
//!
//! The projection used here is the flat-Earth approximation:
//!
//! $$
//! p_n = (\phi - \phi_0) R, \qquad p_e = (\lambda - \lambda_0) R \cos\phi_0, \qquad p_d = -(h - h_0)
//! $$
//!
//! where $\phi$ is latitude, $\lambda$ is longitude, $h$ is altitude and $R$ is the radius in
//! [`LOCAL_TANGENT_RADIUS`]. The approximation is only valid over short horizontal extents
//! (a few tens of kilometers); no ellipsoidal correction is applied.
//!
//! The same formula is used for position error between two samples, except that the cosine term
//! uses the *reference sample's own* latitude rather than the fixed anchor latitude.
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// Earth constants (WGS84)
/// Earth's equitorial radius in meters
pub const EQUATORIAL_RADIUS: f64 = 6378137.0; // meters
/// Radius used by the local-tangent-plane projection, meters.
///
/// Angular offsets are scaled by the WGS84 equatorial radius, not the volumetric mean radius.
pub const LOCAL_TANGENT_RADIUS: f64 = EQUATORIAL_RADIUS;

/// WGS84 geodetic position. Latitude and longitude are stored in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPosition {
    /// Latitude in radians
    pub latitude: f64,
    /// Longitude in radians
    pub longitude: f64,
    /// Altitude in meters
    pub altitude: f64,
}

impl GeodeticPosition {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        GeodeticPosition {
            latitude,
            longitude,
            altitude,
        }
    }
    /// True when all three coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite() && self.altitude.is_finite()
    }
}

impl std::fmt::Display for GeodeticPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.6} deg, {:.6} deg, {:.2} m)",
            self.latitude.to_degrees(),
            self.longitude.to_degrees(),
            self.altitude
        )
    }
}

/// Project a geodetic position onto the local-level NED frame anchored at `anchor`.
///
/// # Arguments
/// * `anchor` - The origin of the local-tangent-plane (latitude and longitude in radians).
/// * `position` - The position to project.
///
/// # Returns
/// The NED offset in meters from the anchor.
///
/// # Example
/// ```rust
/// use navcompare::earth::{GeodeticPosition, geodetic_to_local_tangent};
/// let anchor = GeodeticPosition::new(0.0, 0.0, 100.0);
/// let above = GeodeticPosition::new(0.0, 0.0, 105.0);
/// let ned = geodetic_to_local_tangent(&anchor, &above);
/// assert_eq!(ned[2], -5.0);
/// ```
pub fn geodetic_to_local_tangent(
    anchor: &GeodeticPosition,
    position: &GeodeticPosition,
) -> Vector3<f64> {
    Vector3::new(
        (position.latitude - anchor.latitude) * LOCAL_TANGENT_RADIUS,
        (position.longitude - anchor.longitude) * LOCAL_TANGENT_RADIUS * anchor.latitude.cos(),
        -(position.altitude - anchor.altitude),
    )
}

/// North, east, and down position error of `test` relative to `reference`, in meters.
///
/// Uses the flat-Earth formula with the reference sample's own latitude in the cosine term, so
/// each error depends only on the pair of samples passed in.
pub fn flat_earth_error(reference: &GeodeticPosition, test: &GeodeticPosition) -> Vector3<f64> {
    geodetic_to_local_tangent(reference, test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn anchor_maps_to_origin() {
        let anchor = GeodeticPosition::new(0.7, -1.3, 250.0);
        let ned = geodetic_to_local_tangent(&anchor, &anchor);
        assert_eq!(ned, Vector3::zeros());
    }
    #[test]
    fn north_offset_scales_with_radius() {
        let anchor = GeodeticPosition::new(0.0, 0.0, 0.0);
        let position = GeodeticPosition::new(1e-5, 0.0, 0.0);
        let ned = geodetic_to_local_tangent(&anchor, &position);
        assert_approx_eq!(ned[0], 63.78137, 1e-9);
        assert_approx_eq!(ned[1], 0.0, 1e-12);
    }
    #[test]
    fn east_offset_shrinks_with_anchor_latitude() {
        let anchor = GeodeticPosition::new(60f64.to_radians(), 0.0, 0.0);
        let position = GeodeticPosition::new(60f64.to_radians(), 1e-5, 0.0);
        let ned = geodetic_to_local_tangent(&anchor, &position);
        assert_approx_eq!(ned[1], 63.78137 * 0.5, 1e-6);
    }
    #[test]
    fn down_is_negative_altitude_change() {
        let anchor = GeodeticPosition::new(0.0, 0.0, 100.0);
        let position = GeodeticPosition::new(0.0, 0.0, 90.0);
        assert_eq!(geodetic_to_local_tangent(&anchor, &position)[2], 10.0);
    }
    #[test]
    fn error_uses_reference_latitude() {
        let reference = GeodeticPosition::new(60f64.to_radians(), 0.0, 0.0);
        let test = GeodeticPosition::new(60f64.to_radians(), 2e-5, 3.0);
        let error = flat_earth_error(&reference, &test);
        assert_approx_eq!(error[1], 2e-5 * LOCAL_TANGENT_RADIUS * 0.5, 1e-6);
        assert_eq!(error[2], -3.0);
    }
}
