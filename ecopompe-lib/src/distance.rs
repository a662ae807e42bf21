//! Spherical Earth projected to a plane.
//!
//! Good enough for the tens of kilometres a fuel search covers, and cheap:
//! distances are compared squared so no square root is ever taken. This is
//! not a great-circle formula and degrades quickly for long distances or near
//! the poles, where `cos(latitude)` tends to zero and longitude spans blow up.

use std::f64::consts::PI;

const DEGREES_TO_RADIANS: f64 = PI / 180.0;
pub const EARTH_RADIUS_KM: f64 = 6371.009;
const SQUARED_EARTH_RADIUS_KM2: f64 = EARTH_RADIUS_KM * EARTH_RADIUS_KM;
const KM_TO_DEGREES: f64 = 180.0 / (EARTH_RADIUS_KM * PI);

pub fn lat_degrees_for_distance(km: f64) -> f64 {
    km * KM_TO_DEGREES
}

pub fn lon_degrees_for_distance(km: f64, at_latitude: f64) -> f64 {
    km * KM_TO_DEGREES / (at_latitude * DEGREES_TO_RADIANS).cos()
}

pub fn squared_distance_km2(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat_diff = (lat1 - lat2) * DEGREES_TO_RADIANS;
    let lon_diff = (lon1 - lon2) * DEGREES_TO_RADIANS;
    let lat_mean = (lat1 + lat2) / 2.0 * DEGREES_TO_RADIANS;
    let projected_lon_diff = lat_mean.cos() * lon_diff;
    SQUARED_EARTH_RADIUS_KM2 * (lat_diff * lat_diff + projected_lon_diff * projected_lon_diff)
}
