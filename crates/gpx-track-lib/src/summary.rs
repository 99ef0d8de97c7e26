//! Numeric summaries of runs, points, pauses and whole collections
//!
//! These records carry everything an info popup or overview panel shows, already converted
//! to the units displayed. Turning them into text is left to the caller, typically with
//! [`displayable_distance`](crate::geo_math::displayable_distance) and
//! [`displayable_duration`](crate::geo_math::displayable_duration).

use crate::geo_math::{self, Coordinate};
use crate::{Run, RunPoint, TimezoneInfo, Track};

/// Totals for a single run
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    /// 1-based position of the owning track
    pub track_number: usize,
    /// 1-based position of the run within its track
    pub run_number: usize,
    pub start_timestamp: i64,
    pub end_timestamp: i64,
    pub timezone: TimezoneInfo,
    pub kilometers: f64,
    pub miles: f64,
    pub seconds: f64,
    /// Zero for a run without duration
    pub average_speed_mph: f64,
    pub point_count: usize,
}

impl RunSummary {
    pub fn new(track_number: usize, run_number: usize, run: &Run) -> Self {
        let miles = geo_math::kilometers_to_miles(run.kilometers());
        let hours = run.seconds() / 3600.0;
        let average_speed_mph = if hours > 0.0 { miles / hours } else { 0.0 };

        Self {
            track_number,
            run_number,
            start_timestamp: run.start_timestamp(),
            end_timestamp: run.end_timestamp(),
            timezone: run.timezone().clone(),
            kilometers: run.kilometers(),
            miles,
            seconds: run.seconds(),
            average_speed_mph,
            point_count: run.len(),
        }
    }
}

/// Everything known about one recorded point, relative to its track
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointDetails {
    pub timestamp: i64,
    pub coordinate: Coordinate,
    /// Distance from the start of the track (pauses excluded)
    pub kilometers_from_start: f64,
    pub miles_from_start: f64,
    /// Recorded time since the start of the track (pauses excluded)
    pub milliseconds_from_start: u64,
    pub speed_mph: f64,
    /// 0 when the receiver did not report it
    pub hdop: f64,
    /// 0 when the receiver did not report it
    pub pdop: f64,
    pub fix: Option<String>,
    pub bearing_degrees: Option<f64>,
    pub run_kilometers: f64,
    pub run_miles: f64,
    pub run_seconds: f64,
}

impl PointDetails {
    /// Details of `point`, which must belong to `run`
    pub fn new(run: &Run, point: &RunPoint) -> Self {
        let kilometers_from_start = run.track_offset_kilometers() + point.kilometers_into_run;
        let seconds_from_start = run.track_offset_seconds() + point.seconds_into_run;

        Self {
            timestamp: point.timestamp(),
            coordinate: point.coordinate(),
            kilometers_from_start,
            miles_from_start: geo_math::kilometers_to_miles(kilometers_from_start),
            milliseconds_from_start: (seconds_from_start * 1000.0).round().max(0.0) as u64,
            speed_mph: geo_math::kilometers_per_hour_to_miles_per_hour(point.gpx.speed_kmh),
            hdop: point.gpx.hdop.unwrap_or(0.0),
            pdop: point.gpx.pdop.unwrap_or(0.0),
            fix: point.gpx.fix.clone(),
            bearing_degrees: point.bearing_degrees,
            run_kilometers: run.kilometers(),
            run_miles: geo_math::kilometers_to_miles(run.kilometers()),
            run_seconds: run.seconds(),
        }
    }
}

/// A gap between two consecutive runs of a track
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pause {
    /// Index of the run the pause follows
    pub after_run: usize,
    pub start_timestamp: i64,
    pub end_timestamp: i64,
    pub duration_ms: u64,
    /// Last position before the pause
    pub coordinate: Coordinate,
    /// Straight-line distance between the last point before and the first point after
    pub distance_meters: f64,
}

impl Track {
    /// Pauses between consecutive runs, in order
    ///
    /// Runs that touch (one ends exactly when the next starts) produce a zero-length pause.
    pub fn pauses(&self) -> Vec<Pause> {
        self.runs()
            .windows(2)
            .enumerate()
            .map(|(index, pair)| {
                let before = pair[0].last_point();
                let after = pair[1].first_point();
                Pause {
                    after_run: index,
                    start_timestamp: before.timestamp(),
                    end_timestamp: after.timestamp(),
                    duration_ms: (after.timestamp() - before.timestamp()).max(0) as u64,
                    coordinate: before.coordinate(),
                    distance_meters: geo_math::distance_meters(
                        before.coordinate(),
                        after.coordinate(),
                    ),
                }
            })
            .collect()
    }
}

/// Collection-wide overview
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Overview {
    pub track_count: usize,
    pub run_count: usize,
    /// First point of the first track with runs
    pub start_timestamp: i64,
    /// Last point of the last track with runs
    pub end_timestamp: i64,
    /// Timezone of the last run
    pub timezone: TimezoneInfo,
    pub total_kilometers: f64,
    pub total_miles: f64,
    pub moving_seconds: f64,
    pub paused_ms: u64,
    pub total_points: usize,
    /// Waypoints left out of every run
    pub discarded_count: usize,
}

impl Overview {
    /// Summarize `tracks`, or `None` when none of them has a run
    ///
    /// Tracks without runs still count towards the track and discarded totals.
    pub fn new(tracks: &[Track]) -> Option<Self> {
        let first_run = tracks.iter().find_map(|track| track.runs().first())?;
        let last_run = tracks.iter().rev().find_map(|track| track.runs().last())?;

        let total_kilometers: f64 = tracks.iter().map(Track::kilometers).sum();
        let paused_ms = tracks
            .iter()
            .flat_map(Track::pauses)
            .map(|pause| pause.duration_ms)
            .sum();

        Some(Self {
            track_count: tracks.len(),
            run_count: tracks.iter().map(|track| track.runs().len()).sum(),
            start_timestamp: first_run.start_timestamp(),
            end_timestamp: last_run.end_timestamp(),
            timezone: last_run.timezone().clone(),
            total_kilometers,
            total_miles: geo_math::kilometers_to_miles(total_kilometers),
            moving_seconds: tracks.iter().map(Track::seconds).sum(),
            paused_ms,
            total_points: tracks.iter().map(Track::total_points).sum(),
            discarded_count: tracks.iter().map(|track| track.discarded().len()).sum(),
        })
    }
}
