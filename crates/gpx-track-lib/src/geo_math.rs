//! Distance computation and unit conversions over geographic coordinates
//!
//! Everything in this module is pure and total. Distances are great-circle (haversine)
//! distances on a sphere of radius [`EARTH_RADIUS_METERS`], which stays within roughly
//! ±0.5% of ellipsoidal models: plenty for track analysis, not for surveying.

use geo::Point;

/// Mean Earth radius used for all haversine computations, in meters
pub const EARTH_RADIUS_METERS: f64 = 6_372_800.0;

/// Feet per meter
pub const FEET_PER_METER: f64 = 3.28084;

/// Meters per statute mile
pub const METERS_PER_MILE: f64 = 1609.34;

/// Kilometers per statute mile
pub const KILOMETERS_PER_MILE: f64 = 1.60934;

/// Miles per hour for one meter per second
pub const MPH_PER_METER_PER_SECOND: f64 = 2.2369362921;

/// A WGS84 coordinate in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<Point<f64>> for Coordinate {
    /// `geo` points are (x, y) = (longitude, latitude)
    #[inline]
    fn from(point: Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl From<Coordinate> for Point<f64> {
    #[inline]
    fn from(coordinate: Coordinate) -> Self {
        Point::new(coordinate.longitude, coordinate.latitude)
    }
}

/// Great-circle distance between two coordinates in meters
///
/// Symmetric, non-negative and exactly zero for identical coordinates. The haversine term is
/// clamped to `[0, 1]` so rounding near identical or antipodal points never yields NaN.
#[inline]
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Initial bearing from `from` towards `to`, in degrees clockwise from north within `[0, 360)`
///
/// Identical coordinates give 0.
pub fn initial_bearing_degrees(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);

    // rem_euclid can round up to exactly 360 for tiny negative angles
    if bearing >= 360.0 { 0.0 } else { bearing }
}

#[inline]
pub fn meters_to_feet(meters: f64) -> f64 {
    meters * FEET_PER_METER
}

#[inline]
pub fn feet_to_meters(feet: f64) -> f64 {
    feet / FEET_PER_METER
}

#[inline]
pub fn meters_to_kilometers(meters: f64) -> f64 {
    meters / 1000.0
}

#[inline]
pub fn kilometers_to_meters(kilometers: f64) -> f64 {
    kilometers * 1000.0
}

#[inline]
pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

#[inline]
pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

#[inline]
pub fn kilometers_to_miles(kilometers: f64) -> f64 {
    kilometers / KILOMETERS_PER_MILE
}

#[inline]
pub fn miles_to_kilometers(miles: f64) -> f64 {
    miles * KILOMETERS_PER_MILE
}

#[inline]
pub fn meters_per_second_to_miles_per_hour(mps: f64) -> f64 {
    mps * MPH_PER_METER_PER_SECOND
}

#[inline]
pub fn miles_per_hour_to_meters_per_second(mph: f64) -> f64 {
    mph / MPH_PER_METER_PER_SECOND
}

#[inline]
pub fn kilometers_per_hour_to_miles_per_hour(kmh: f64) -> f64 {
    kmh / KILOMETERS_PER_MILE
}

#[inline]
pub fn miles_per_hour_to_kilometers_per_hour(mph: f64) -> f64 {
    mph * KILOMETERS_PER_MILE
}

#[inline]
pub fn meters_per_second_to_kilometers_per_hour(mps: f64) -> f64 {
    mps * 3.6
}

/// Round a distance for display based on its magnitude
///
/// | Range       | Output                |
/// |-------------|-----------------------|
/// | `d < 1`     | 3 decimals            |
/// | `d < 10`    | 2 decimals            |
/// | `d < 100`   | 1 decimal             |
/// | otherwise   | the value, unrounded  |
///
/// The thresholds are exclusive upper bounds: `1.0` prints with two decimals.
pub fn displayable_distance(d: f64) -> String {
    if d < 1.0 {
        format!("{d:.3}")
    } else if d < 10.0 {
        format!("{d:.2}")
    } else if d < 100.0 {
        format!("{d:.1}")
    } else {
        format!("{d}")
    }
}

/// Format a duration as `H:MM:SS`, or `M:SS` when under an hour
///
/// Components are truncated, never rounded. Minutes are zero-padded only when an hour
/// component precedes them, so 59 seconds prints as `0:59` and one hour, one minute and one
/// second as `1:01:01`.
pub fn displayable_duration(milliseconds: u64) -> String {
    let total_seconds = milliseconds / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;

    let mut display = String::new();
    if hours > 0 {
        display.push_str(&format!("{hours}:"));
    }

    if hours == 0 || minutes >= 10 {
        display.push_str(&format!("{minutes}:"));
    } else {
        display.push_str(&format!("0{minutes}:"));
    }

    display.push_str(&format!("{seconds:02}"));
    display
}
