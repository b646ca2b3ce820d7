//! Spherical-Earth conversions between coordinates and metre offsets.
//!
//! All functions treat the Earth as a sphere of radius [`EARTH_RADIUS_M`].
//! Over the ranges an AR scene covers (a few kilometres) the error against
//! the WGS84 ellipsoid is far below GPS noise.
//!
//! # Example
//!
//! ```rust
//! use scenegeo_geodesy::{apply_translation, translation};
//! use scenegeo_types::{GeoCoordinate, LocationTranslation};
//!
//! let origin = GeoCoordinate::new(51.5007, -0.1246, 20.0).unwrap();
//! let offset = LocationTranslation::new(250.0, -120.0, 5.0);
//!
//! let moved = apply_translation(&origin, offset);
//! let back = translation(&origin, &moved);
//!
//! assert!((back.north - 250.0).abs() < 0.5);
//! assert!((back.east + 120.0).abs() < 0.5);
//! assert!((back.altitude - 5.0).abs() < 1e-9);
//! ```

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use scenegeo_types::{GeoCoordinate, LocationTranslation};

use crate::angles::{angle_delta, degrees_to_radians, radians_to_degrees};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Below this the Mercator latitude difference is treated as zero.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Great-circle ground distance in metres between two coordinates
/// (haversine). Altitude is ignored.
pub fn distance(a: &GeoCoordinate, b: &GeoCoordinate) -> f64 {
    ground_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Straight-line distance in metres combining the ground distance with the
/// altitude difference.
pub fn distance_3d(a: &GeoCoordinate, b: &GeoCoordinate) -> f64 {
    let ground = distance(a, b);
    let climb = b.altitude - a.altitude;
    (ground * ground + climb * climb).sqrt()
}

fn ground_distance(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64) -> f64 {
    let lat1 = degrees_to_radians(lat1_deg);
    let lat2 = degrees_to_radians(lat2_deg);
    let d_lat = lat2 - lat1;
    let d_lon = degrees_to_radians(lon2_deg - lon1_deg);

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Decompose the offset from `from` to `to` into north/east/up metres.
///
/// The corner point shares `from`'s latitude and `to`'s longitude. The
/// north component is the distance from the corner up (or down) the meridian
/// to `to`; the east component is the distance along `from`'s latitude to
/// the corner.
pub fn translation(from: &GeoCoordinate, to: &GeoCoordinate) -> LocationTranslation {
    let corner_lat = from.latitude;
    let corner_lon = to.longitude;

    let north_distance = ground_distance(to.latitude, to.longitude, corner_lat, corner_lon);
    let north = if to.latitude > corner_lat {
        north_distance
    } else {
        -north_distance
    };

    let east_distance = ground_distance(from.latitude, from.longitude, corner_lat, corner_lon);
    // Signed the short way round, so offsets across the antimeridian keep
    // their direction.
    let east = if angle_delta(corner_lon, from.longitude) < 0.0 {
        -east_distance
    } else {
        east_distance
    };

    LocationTranslation::new(north, east, to.altitude - from.altitude)
}

/// Travel `distance_m` metres from `origin` along a rhumb line of constant
/// `bearing_deg` (clockwise from north).
///
/// Crossing a pole reflects the latitude back into `[-90, 90]`; the
/// longitude is normalised into `(-180, 180]`. Altitude, accuracy and
/// timestamp are carried over from `origin`.
pub fn destination(origin: &GeoCoordinate, bearing_deg: f64, distance_m: f64) -> GeoCoordinate {
    let lat1 = degrees_to_radians(origin.latitude);
    let lon1 = degrees_to_radians(origin.longitude);
    let angular = distance_m / EARTH_RADIUS_M;
    let bearing = degrees_to_radians(bearing_deg);

    let mut lat2 = lat1 + angular * bearing.cos();
    let d_lat = lat2 - lat1;
    let d_phi = ((lat2 / 2.0 + FRAC_PI_4).tan() / (lat1 / 2.0 + FRAC_PI_4).tan()).ln();
    // An east-west line has no Mercator stretch to divide by.
    let q = if d_phi.abs() > SINGULAR_EPSILON {
        d_lat / d_phi
    } else {
        lat1.cos()
    };
    let d_lon = if q.abs() > SINGULAR_EPSILON {
        angular * bearing.sin() / q
    } else {
        0.0
    };

    if lat2.abs() > FRAC_PI_2 {
        lat2 = if lat2 > 0.0 { PI - lat2 } else { -PI - lat2 };
    }

    let mut lon2 = (lon1 + d_lon + PI).rem_euclid(2.0 * PI) - PI;
    if lon2 <= -PI {
        lon2 = PI;
    }

    GeoCoordinate {
        latitude: radians_to_degrees(lat2),
        longitude: radians_to_degrees(lon2),
        ..*origin
    }
}

/// Move `origin` by `offset`: the north component along bearing 0°, the east
/// component along bearing 90°, then add the altitude offset.
pub fn apply_translation(origin: &GeoCoordinate, offset: LocationTranslation) -> GeoCoordinate {
    let northward = destination(origin, 0.0, offset.north);
    let eastward = destination(origin, 90.0, offset.east);

    GeoCoordinate {
        latitude: northward.latitude,
        longitude: eastward.longitude,
        altitude: origin.altitude + offset.altitude,
        ..*origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64, alt: f64) -> GeoCoordinate {
        GeoCoordinate::new(lat, lon, alt).unwrap()
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance(&coord(0.0, 0.0, 0.0), &coord(1.0, 0.0, 0.0));
        assert!((d - 111_194.9).abs() < 1.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = coord(21.0285, 105.8542, 0.0);
        let b = coord(21.0301, 105.8500, 0.0);
        assert!((distance(&a, &b) - distance(&b, &a)).abs() < 1e-9);
        assert_eq!(distance(&a, &a), 0.0);
    }

    #[test]
    fn distance_3d_includes_altitude() {
        let a = coord(10.0, 10.0, 0.0);
        let b = coord(10.0, 10.0, 30.0);
        assert!((distance_3d(&a, &b) - 30.0).abs() < 1e-9);
        assert_eq!(distance(&a, &b), 0.0);
    }

    #[test]
    fn translation_signs_follow_cardinal_directions() {
        let origin = coord(45.0, 7.0, 100.0);
        let north_east = coord(45.001, 7.001, 110.0);
        let t = translation(&origin, &north_east);
        assert!(t.north > 0.0);
        assert!(t.east > 0.0);
        assert!((t.altitude - 10.0).abs() < 1e-9);

        let south_west = coord(44.999, 6.999, 90.0);
        let t = translation(&origin, &south_west);
        assert!(t.north < 0.0);
        assert!(t.east < 0.0);
        assert!((t.altitude + 10.0).abs() < 1e-9);
    }

    #[test]
    fn due_north_destination_keeps_longitude() {
        let origin = coord(10.0, 20.0, 5.0);
        let moved = destination(&origin, 0.0, 1_000.0);
        assert!(moved.latitude > origin.latitude);
        assert!((moved.longitude - origin.longitude).abs() < 1e-12);
        assert!((distance(&origin, &moved) - 1_000.0).abs() < 1e-6);
        assert_eq!(moved.altitude, 5.0);
    }

    #[test]
    fn due_east_destination_keeps_latitude() {
        let origin = coord(-33.86, 151.21, 0.0);
        let moved = destination(&origin, 90.0, 2_000.0);
        assert!((moved.latitude - origin.latitude).abs() < 1e-9);
        assert!(moved.longitude > origin.longitude);
    }

    #[test]
    fn crossing_north_pole_reflects_latitude() {
        let origin = coord(89.9, 30.0, 0.0);
        let moved = destination(&origin, 0.0, 50_000.0);
        assert!(moved.latitude <= 90.0);
        assert!((moved.latitude - 89.650_3).abs() < 1e-3, "got {}", moved.latitude);
    }

    #[test]
    fn crossing_south_pole_reflects_latitude() {
        let origin = coord(-89.9, 30.0, 0.0);
        let moved = destination(&origin, 180.0, 50_000.0);
        assert!(moved.latitude >= -90.0);
        assert!((moved.latitude + 89.650_3).abs() < 1e-3, "got {}", moved.latitude);
    }

    #[test]
    fn crossing_date_line_wraps_longitude() {
        let origin = coord(0.0, 179.9, 0.0);
        let moved = destination(&origin, 90.0, 30_000.0);
        assert!(moved.longitude > -180.0 && moved.longitude <= 180.0);
        assert!(moved.longitude < 0.0, "expected a western longitude, got {}", moved.longitude);
        assert!((moved.longitude + 179.830_2).abs() < 1e-3);
    }

    #[test]
    fn translation_across_date_line_keeps_east_sign() {
        let origin = coord(0.0, 179.9, 0.0);
        let moved = apply_translation(&origin, LocationTranslation::new(0.0, 30_000.0, 0.0));
        assert!(moved.longitude < 0.0);

        let back = translation(&origin, &moved);
        assert!((back.east - 30_000.0).abs() < 0.5, "east = {}", back.east);
        assert!(back.north.abs() < 0.5);

        let west = translation(&moved, &origin);
        assert!((west.east + 30_000.0).abs() < 0.5, "east = {}", west.east);
    }

    #[test]
    fn apply_then_measure_roundtrips_within_half_a_metre() {
        let origin = coord(48.8566, 2.3522, 35.0);
        let offsets = [
            LocationTranslation::new(1_200.0, -3_400.0, 12.5),
            LocationTranslation::new(-30_000.0, 40_000.0, -20.0),
            LocationTranslation::new(0.0, 0.0, 0.0),
        ];
        for offset in offsets {
            let back = translation(&origin, &apply_translation(&origin, offset));
            assert!((back.north - offset.north).abs() < 0.5, "{offset:?} → {back:?}");
            assert!((back.east - offset.east).abs() < 0.5, "{offset:?} → {back:?}");
            assert!((back.altitude - offset.altitude).abs() < 1e-9);
        }
    }

    #[test]
    fn apply_translation_preserves_fix_metadata() {
        let origin = coord(1.0, 1.0, 0.0).with_accuracy(7.0, 3.0);
        let moved = apply_translation(&origin, LocationTranslation::new(10.0, 10.0, 1.0));
        assert_eq!(moved.horizontal_accuracy, 7.0);
        assert_eq!(moved.vertical_accuracy, 3.0);
        assert_eq!(moved.timestamp, origin.timestamp);
        assert_eq!(moved.altitude, 1.0);
    }
}
