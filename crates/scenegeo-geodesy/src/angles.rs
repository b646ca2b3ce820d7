//! Compass arithmetic in degrees.

/// Convert degrees to radians.
pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// Convert radians to degrees.
pub fn radians_to_degrees(radians: f64) -> f64 {
    radians * 180.0 / std::f64::consts::PI
}

/// Wrap `degrees` into `[0, 360)`.
///
/// ```
/// use scenegeo_geodesy::normalize_angle;
///
/// assert_eq!(normalize_angle(370.0), 10.0);
/// assert_eq!(normalize_angle(-10.0), 350.0);
/// ```
pub fn normalize_angle(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Shortest signed rotation from `b` to `a`, in `(-180, 180]`.
///
/// ```
/// use scenegeo_geodesy::angle_delta;
///
/// assert_eq!(angle_delta(350.0, 10.0), -20.0);
/// assert_eq!(angle_delta(10.0, 350.0), 20.0);
/// ```
pub fn angle_delta(a: f64, b: f64) -> f64 {
    let delta = normalize_angle(a - b);
    if delta > 180.0 { delta - 360.0 } else { delta }
}
