//! Spatial math for leg distances and bearings.

use crate::models::Waypoint;

/// Mean earth radius in feet; the engine works in feet and minutes
/// throughout.
pub const EARTH_RADIUS_FT: f64 = 2.093e7;

/// Calculate great-circle distance between two waypoints in feet using the
/// Haversine formula.
pub fn haversine_distance_ft(a: &Waypoint, b: &Waypoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let dphi = (b.latitude - a.latitude).to_radians();
    let dlambda = (b.longitude - a.longitude).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_FT * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial great-circle bearing from `a` to `b` in degrees, normalized to
/// [0, 360).
pub fn initial_bearing_deg(a: &Waypoint, b: &Waypoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let dlambda = (b.longitude - a.longitude).to_radians();

    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Reciprocal of a bearing in degrees.
pub fn reciprocal_deg(bearing: f64) -> f64 {
    (bearing + 180.0) % 360.0
}
