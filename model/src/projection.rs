use std::f64::consts::PI;

use geom::Pt2D;

pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Projects onto a fixed-radius cylinder, Web-Mercator style. Note the axes: `x` comes from the
/// latitude and `y` from the longitude, matching how the scene lays out roads.
///
/// Undefined at the poles; check `is_projectable` first for untrusted input.
pub fn project(lat: f64, lon: f64) -> Pt2D {
    let x = EARTH_RADIUS_METERS * (PI / 4.0 + lat * PI / 360.0).tan().ln();
    let y = EARTH_RADIUS_METERS * lon * PI / 180.0;
    Pt2D::new(x, y)
}

pub fn is_projectable(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && lat.abs() < 90.0
}
