//! `scenegeo-geodesy` – Geodetic Math.
//!
//! Pure, stateless functions that move between angles, great-circle
//! distances and metre offsets on a spherical Earth.
//!
//! # Modules
//!
//! - [`angles`] – [`normalize_angle`][angles::normalize_angle] and
//!   [`angle_delta`][angles::angle_delta]: compass arithmetic in degrees.
//! - [`geodetic`] – [`distance`][geodetic::distance],
//!   [`translation`][geodetic::translation],
//!   [`destination`][geodetic::destination] and
//!   [`apply_translation`][geodetic::apply_translation]: conversion between
//!   two coordinates and the north/east/up offset that separates them.

pub mod angles;
pub mod geodetic;

pub use angles::{angle_delta, degrees_to_radians, normalize_angle, radians_to_degrees};
pub use geodetic::{
    EARTH_RADIUS_M, apply_translation, destination, distance, distance_3d, translation,
};
