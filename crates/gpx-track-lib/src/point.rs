//! Point records: decoded GPX fixes and their run-relative derivatives

use crate::geo_math::{self, Coordinate};
use crate::{DataError, Result};
use std::fmt;
use time::OffsetDateTime;

/// A single timestamped fix as produced by the upstream decoder
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpxPoint {
    pub coordinate: Coordinate,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub speed_kmh: f64,
    pub hdop: Option<f64>,
    pub pdop: Option<f64>,
    pub fix: Option<String>,
}

impl GpxPoint {
    /// Create a point with no quality metrics
    pub fn new(coordinate: Coordinate, timestamp: i64, speed_kmh: f64) -> Self {
        Self {
            coordinate,
            timestamp,
            speed_kmh,
            hdop: None,
            pdop: None,
            fix: None,
        }
    }

    /// Convert a decoded GPX waypoint
    ///
    /// # Arguments
    /// * `waypoint` - Decoded waypoint, must carry a timestamp
    /// * `index` - Position of the waypoint in its segment (for error reporting)
    /// * `previous` - The point recorded just before, used to derive a speed when the
    ///   waypoint has none
    pub fn from_waypoint(
        waypoint: &gpx::Waypoint,
        index: usize,
        previous: Option<&GpxPoint>,
    ) -> Result<Self> {
        let timestamp =
            waypoint_timestamp(waypoint).ok_or(DataError::MissingTimestamp { index })?;
        Ok(Self::from_timed_waypoint(waypoint, timestamp, previous))
    }

    /// Convert a waypoint whose timestamp was already read with [`waypoint_timestamp`]
    pub(crate) fn from_timed_waypoint(
        waypoint: &gpx::Waypoint,
        timestamp: i64,
        previous: Option<&GpxPoint>,
    ) -> Self {
        let coordinate = Coordinate::from(waypoint.point());

        let speed_kmh = match (waypoint.speed, previous) {
            (Some(mps), _) => geo_math::meters_per_second_to_kilometers_per_hour(mps),
            (None, Some(prev)) => derived_speed_kmh(prev, coordinate, timestamp),
            (None, None) => 0.0,
        };

        Self {
            coordinate,
            timestamp,
            speed_kmh,
            hdop: waypoint.hdop,
            pdop: waypoint.pdop,
            fix: waypoint.fix.as_ref().map(fix_label),
        }
    }
}

/// Why a waypoint was left out of every run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiscardReason {
    MissingTimestamp,
    /// Recorded before the point kept just ahead of it
    TimestampOutOfOrder,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTimestamp => write!(f, "no timestamp"),
            Self::TimestampOutOfOrder => write!(f, "timestamp out of order"),
        }
    }
}

/// A waypoint skipped during ingestion, kept so it can still be reported
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscardedPoint {
    /// Segment of the GPX track the waypoint came from
    pub segment: usize,
    /// Position of the waypoint within its segment
    pub index: usize,
    pub coordinate: Coordinate,
    /// Epoch milliseconds, when the waypoint had a time at all
    pub timestamp: Option<i64>,
    pub reason: DiscardReason,
    pub fix: Option<String>,
    /// 0 when the receiver did not report it
    pub hdop: f64,
    /// 0 when the receiver did not report it
    pub pdop: f64,
}

impl DiscardedPoint {
    pub(crate) fn new(
        waypoint: &gpx::Waypoint,
        index: usize,
        timestamp: Option<i64>,
        reason: DiscardReason,
    ) -> Self {
        Self {
            segment: 0,
            index,
            coordinate: Coordinate::from(waypoint.point()),
            timestamp,
            reason,
            fix: waypoint.fix.as_ref().map(fix_label),
            hdop: waypoint.hdop.unwrap_or(0.0),
            pdop: waypoint.pdop.unwrap_or(0.0),
        }
    }
}

/// A point inside a [`Run`](crate::Run), with offsets from the run's first point
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunPoint {
    pub gpx: GpxPoint,
    /// Distance travelled since the first point of the run
    pub kilometers_into_run: f64,
    /// Time elapsed since the first point of the run
    pub seconds_into_run: f64,
    /// Bearing from the previous point, `None` for the first point
    pub bearing_degrees: Option<f64>,
}

impl RunPoint {
    #[inline]
    pub fn coordinate(&self) -> Coordinate {
        self.gpx.coordinate
    }

    #[inline]
    pub fn timestamp(&self) -> i64 {
        self.gpx.timestamp
    }
}

/// Waypoint time in epoch milliseconds, `None` when it has no time
pub(crate) fn waypoint_timestamp(waypoint: &gpx::Waypoint) -> Option<i64> {
    let time: OffsetDateTime = waypoint.time.clone()?.into();
    Some((time.unix_timestamp_nanos() / 1_000_000) as i64)
}

fn derived_speed_kmh(previous: &GpxPoint, coordinate: Coordinate, timestamp: i64) -> f64 {
    let elapsed_ms = timestamp - previous.timestamp;
    if elapsed_ms <= 0 {
        return 0.0;
    }
    let meters = geo_math::distance_meters(previous.coordinate, coordinate);
    geo_math::meters_per_second_to_kilometers_per_hour(meters / (elapsed_ms as f64 / 1000.0))
}

fn fix_label(fix: &gpx::Fix) -> String {
    match fix {
        gpx::Fix::None => "none".to_string(),
        gpx::Fix::TwoDimensional => "2d".to_string(),
        gpx::Fix::ThreeDimensional => "3d".to_string(),
        gpx::Fix::DGPS => "dgps".to_string(),
        gpx::Fix::PPS => "pps".to_string(),
        gpx::Fix::Other(other) => other.clone(),
    }
}
