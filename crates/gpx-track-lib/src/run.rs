//! Run and track storage
//!
//! A [`Track`] owns an ordered list of [`Run`]s and a run owns its ordered points. Both are
//! validated and annotated once during construction (cumulative offsets, bearings, bounds)
//! and never change afterwards.

use crate::geo_math::{self, Coordinate};
use crate::point::{self, DiscardReason, DiscardedPoint};
use crate::{DataError, GpxPoint, Result, RunPoint};
use geo::Rect;
use std::time::Duration;

/// Timezone labels attached to a run, passed through untouched for display code
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimezoneInfo {
    /// IANA identifier, e.g. `Europe/Madrid`
    pub id: String,
    /// Short tag shown next to times, e.g. `CEST`
    pub tag: String,
}

impl TimezoneInfo {
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
        }
    }
}

impl Default for TimezoneInfo {
    fn default() -> Self {
        Self::new("UTC", "UTC")
    }
}

/// A contiguous recording: a non-empty, time-ordered sequence of points
///
/// Serialized as its input points; deserializing goes back through [`Run::new`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "RunRecord", try_from = "RunRecord"))]
pub struct Run {
    points: Vec<RunPoint>,
    timezone: TimezoneInfo,
    /// Bounding box with x = longitude, y = latitude
    bounds: Rect<f64>,
    start_timestamp: i64,
    end_timestamp: i64,
    kilometers: f64,
    seconds: f64,
    /// Distance covered by the preceding runs of the owning track
    track_offset_kilometers: f64,
    /// Duration of the preceding runs of the owning track
    track_offset_seconds: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Run {
    /// Build a run from time-ordered points
    ///
    /// # Returns
    /// The annotated run, or an error if `points` is empty or its timestamps decrease.
    /// Equal consecutive timestamps are accepted.
    pub fn new(points: Vec<GpxPoint>, timezone: TimezoneInfo) -> Result<Self> {
        let (start, end) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first.timestamp, last.timestamp),
            _ => return Err(DataError::EmptyRun),
        };

        let mut min_lat = f64::INFINITY;
        let mut min_lon = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut max_lon = f64::NEG_INFINITY;

        let mut run_points: Vec<RunPoint> = Vec::with_capacity(points.len());
        let mut meters = 0.0;
        let mut previous: Option<&GpxPoint> = None;

        for (index, point) in points.iter().enumerate() {
            let mut bearing = None;
            if let Some(prev) = previous {
                if point.timestamp < prev.timestamp {
                    return Err(DataError::NonMonotonicTimestamps {
                        index,
                        previous: prev.timestamp,
                        current: point.timestamp,
                    });
                }
                meters += geo_math::distance_meters(prev.coordinate, point.coordinate);
                bearing = Some(geo_math::initial_bearing_degrees(
                    prev.coordinate,
                    point.coordinate,
                ));
            }

            min_lat = min_lat.min(point.coordinate.latitude);
            min_lon = min_lon.min(point.coordinate.longitude);
            max_lat = max_lat.max(point.coordinate.latitude);
            max_lon = max_lon.max(point.coordinate.longitude);

            run_points.push(RunPoint {
                gpx: point.clone(),
                kilometers_into_run: geo_math::meters_to_kilometers(meters),
                seconds_into_run: (point.timestamp - start) as f64 / 1000.0,
                bearing_degrees: bearing,
            });
            previous = Some(point);
        }

        let bounds = Rect::new(
            geo::Coord {
                x: min_lon,
                y: min_lat,
            },
            geo::Coord {
                x: max_lon,
                y: max_lat,
            },
        );

        Ok(Self {
            points: run_points,
            timezone,
            bounds,
            start_timestamp: start,
            end_timestamp: end,
            kilometers: geo_math::meters_to_kilometers(meters),
            seconds: (end - start) as f64 / 1000.0,
            track_offset_kilometers: 0.0,
            track_offset_seconds: 0.0,
        })
    }

    /// Convert a decoded GPX segment into one or more runs
    ///
    /// Points are split into a new run wherever two consecutive timestamps are further apart
    /// than `split_gap`. With `None` the whole segment becomes a single run. Waypoints without
    /// a time, or recorded before the point kept ahead of them, are returned separately.
    pub fn from_segment(
        segment: &gpx::TrackSegment,
        timezone: &TimezoneInfo,
        split_gap: Option<Duration>,
    ) -> Result<(Vec<Self>, Vec<DiscardedPoint>)> {
        #[cfg(feature = "profiling")]
        profiling::scope!("run::from_segment");

        let gap_ms = split_gap.map(|gap| gap.as_millis() as i64);
        let mut runs = Vec::new();
        let mut discarded = Vec::new();
        let mut current: Vec<GpxPoint> = Vec::new();

        for (index, waypoint) in segment.points.iter().enumerate() {
            let Some(timestamp) = point::waypoint_timestamp(waypoint) else {
                tracing::debug!("Discarding point {index} without timestamp");
                discarded.push(DiscardedPoint::new(
                    waypoint,
                    index,
                    None,
                    DiscardReason::MissingTimestamp,
                ));
                continue;
            };

            let pause_ms = current.last().map(|prev| timestamp - prev.timestamp);
            if pause_ms.is_some_and(|pause| pause < 0) {
                tracing::debug!("Discarding point {index} recorded out of order");
                discarded.push(DiscardedPoint::new(
                    waypoint,
                    index,
                    Some(timestamp),
                    DiscardReason::TimestampOutOfOrder,
                ));
                continue;
            }

            if let (Some(gap), Some(pause)) = (gap_ms, pause_ms) {
                if pause > gap {
                    tracing::debug!("Splitting run at point {index} after a {pause} ms pause");
                    runs.push(Self::new(std::mem::take(&mut current), timezone.clone())?);
                }
            }

            // Empty after a split, so no speed is derived across the pause
            let gpx_point = GpxPoint::from_timed_waypoint(waypoint, timestamp, current.last());
            current.push(gpx_point);
        }

        if !current.is_empty() {
            runs.push(Self::new(current, timezone.clone())?);
        }

        Ok((runs, discarded))
    }

    /// All points in recording order (never empty)
    #[inline]
    pub fn points(&self) -> &[RunPoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`: runs cannot be constructed without points
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn first_point(&self) -> &RunPoint {
        &self.points[0]
    }

    #[inline]
    pub fn last_point(&self) -> &RunPoint {
        &self.points[self.points.len() - 1]
    }

    /// Timestamp of the first point, epoch milliseconds
    #[inline]
    pub fn start_timestamp(&self) -> i64 {
        self.start_timestamp
    }

    /// Timestamp of the last point, epoch milliseconds
    #[inline]
    pub fn end_timestamp(&self) -> i64 {
        self.end_timestamp
    }

    /// Whether `timestamp` lies in `[start, end]`, both ends inclusive
    #[inline]
    pub fn contains_timestamp(&self, timestamp: i64) -> bool {
        timestamp >= self.start_timestamp && timestamp <= self.end_timestamp
    }

    #[inline]
    pub fn timezone(&self) -> &TimezoneInfo {
        &self.timezone
    }

    /// Bounding box in degrees (x = longitude, y = latitude)
    #[inline]
    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    #[inline]
    pub fn kilometers(&self) -> f64 {
        self.kilometers
    }

    #[inline]
    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    #[inline]
    pub fn track_offset_kilometers(&self) -> f64 {
        self.track_offset_kilometers
    }

    #[inline]
    pub fn track_offset_seconds(&self) -> f64 {
        self.track_offset_seconds
    }
}

/// An ordered list of non-overlapping runs, typically one per imported track
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "TrackRecord"))]
pub struct Track {
    runs: Vec<Run>,
    /// Waypoints that made it into no run
    discarded: Vec<DiscardedPoint>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Track {
    /// Build a track and assign each run its offsets within the track
    ///
    /// Runs must be time-ordered and must not overlap. A run may start exactly when the
    /// previous one ends.
    pub fn new(mut runs: Vec<Run>) -> Result<Self> {
        for index in 1..runs.len() {
            let previous_end = runs[index - 1].end_timestamp;
            let start = runs[index].start_timestamp;
            if start < previous_end {
                return Err(DataError::OverlappingRuns {
                    index,
                    previous_end,
                    start,
                });
            }
        }

        let mut offset_kilometers = 0.0;
        let mut offset_seconds = 0.0;
        for run in &mut runs {
            run.track_offset_kilometers = offset_kilometers;
            run.track_offset_seconds = offset_seconds;
            offset_kilometers += run.kilometers;
            offset_seconds += run.seconds;
        }

        Ok(Self {
            runs,
            discarded: Vec::new(),
        })
    }

    /// Attach the waypoints skipped while building this track
    pub fn with_discarded(mut self, discarded: Vec<DiscardedPoint>) -> Self {
        self.discarded = discarded;
        self
    }

    /// Convert a decoded GPX track, one or more runs per segment
    ///
    /// Segments without points are skipped.
    pub fn from_gpx_track(
        track: &gpx::Track,
        timezone: &TimezoneInfo,
        split_gap: Option<Duration>,
    ) -> Result<Self> {
        let mut runs = Vec::new();
        let mut discarded = Vec::new();
        for (segment_index, segment) in track.segments.iter().enumerate() {
            if segment.points.is_empty() {
                tracing::warn!("Skipping empty segment {segment_index}");
                continue;
            }
            let (segment_runs, segment_discarded) =
                Run::from_segment(segment, timezone, split_gap)?;
            runs.extend(segment_runs);
            discarded.extend(segment_discarded.into_iter().map(|mut point| {
                point.segment = segment_index;
                point
            }));
        }
        if !discarded.is_empty() {
            tracing::warn!("Discarded {} points", discarded.len());
        }
        Ok(Self::new(runs)?.with_discarded(discarded))
    }

    #[inline]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Whether the track has no runs (it may still hold discarded points)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    #[inline]
    pub fn discarded(&self) -> &[DiscardedPoint] {
        &self.discarded
    }

    /// Timestamp of the first recorded point, `None` for a track without runs
    #[inline]
    pub fn start_timestamp(&self) -> Option<i64> {
        self.runs.first().map(Run::start_timestamp)
    }

    /// Timestamp of the last recorded point, `None` for a track without runs
    #[inline]
    pub fn end_timestamp(&self) -> Option<i64> {
        self.runs.last().map(Run::end_timestamp)
    }

    pub fn total_points(&self) -> usize {
        self.runs.iter().map(Run::len).sum()
    }

    /// Distance across all runs, excluding the gaps between them
    pub fn kilometers(&self) -> f64 {
        self.runs.iter().map(Run::kilometers).sum()
    }

    /// Recorded time across all runs, excluding the gaps between them
    pub fn seconds(&self) -> f64 {
        self.runs.iter().map(Run::seconds).sum()
    }

    pub fn first_coordinate(&self) -> Option<Coordinate> {
        self.runs.first().map(|run| run.first_point().coordinate())
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RunRecord {
    points: Vec<GpxPoint>,
    timezone: TimezoneInfo,
}

#[cfg(feature = "serde")]
impl From<Run> for RunRecord {
    fn from(run: Run) -> Self {
        Self {
            points: run.points.into_iter().map(|point| point.gpx).collect(),
            timezone: run.timezone,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<RunRecord> for Run {
    type Error = DataError;

    fn try_from(record: RunRecord) -> Result<Self> {
        Run::new(record.points, record.timezone)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct TrackRecord {
    runs: Vec<Run>,
    #[serde(default)]
    discarded: Vec<DiscardedPoint>,
}

#[cfg(feature = "serde")]
impl TryFrom<TrackRecord> for Track {
    type Error = DataError;

    fn try_from(record: TrackRecord) -> Result<Self> {
        Ok(Track::new(record.runs)?.with_discarded(record.discarded))
    }
}
