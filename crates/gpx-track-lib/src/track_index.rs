//! Time and position lookups over the track → run → point hierarchy
//!
//! - [`find_track_and_run`] answers "which run was recording at this instant?"
//! - [`find_nearest_point`] answers "which recorded point of this run is closest to here?"
//!
//! Both are plain scans over caller-owned data. [`RunTimeline`] offers the same run lookup in
//! O(log n) once built.

use crate::geo_math::{self, Coordinate};
use crate::sorted_search;
use crate::{DataError, GpxPoint, Result, Run, RunPoint, Track};
use std::cmp::Ordering;

/// A run located by [`find_track_and_run`], with its owning track
#[derive(Clone, Copy, Debug)]
pub struct TrackAndRun<'a> {
    pub track: &'a Track,
    pub run: &'a Run,
    /// Position of `track` in the searched slice
    pub track_index: usize,
    /// Position of `run` within `track`
    pub run_index: usize,
}

/// Find the run whose time interval contains the timestamp of `point`
///
/// See [`find_track_and_run_at`].
#[inline]
pub fn find_track_and_run<'a>(tracks: &'a [Track], point: &GpxPoint) -> Option<TrackAndRun<'a>> {
    find_track_and_run_at(tracks, point.timestamp)
}

/// Find the first run, in track then run order, whose interval `[start, end]` contains
/// `timestamp`
///
/// Both interval ends are inclusive, so a timestamp shared by the end of one run and the start
/// of the next resolves to the earlier run. A timestamp that falls in a pause between runs, or
/// outside every track, yields `None`.
pub fn find_track_and_run_at(tracks: &[Track], timestamp: i64) -> Option<TrackAndRun<'_>> {
    tracks
        .iter()
        .enumerate()
        .flat_map(|(track_index, track)| {
            track
                .runs()
                .iter()
                .enumerate()
                .map(move |(run_index, run)| TrackAndRun {
                    track,
                    run,
                    track_index,
                    run_index,
                })
        })
        .find(|found| found.run.contains_timestamp(timestamp))
}

/// Find the point of `run` closest to (`lat`, `lon`)
///
/// When several points are equally close the earliest one wins. The returned reference points
/// into `run`; no copy is made.
///
/// # Returns
/// `None` only for an empty run, which [`Run::new`] never produces.
#[inline]
pub fn find_nearest_point(run: &Run, lat: f64, lon: f64) -> Option<&RunPoint> {
    find_nearest_point_index(run, Coordinate::new(lat, lon))
        .map(|(index, _)| &run.points()[index])
}

/// Index of the point of `run` closest to `target`, with its distance in meters
pub fn find_nearest_point_index(run: &Run, target: Coordinate) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, point) in run.points().iter().enumerate() {
        let d = geo_math::distance_meters(point.coordinate(), target);
        // Strict improvement only, so the first of several equidistant points is kept
        let improved = match best {
            Some((_, best_distance)) => d < best_distance,
            None => true,
        };
        if improved {
            best = Some((index, d));
        }
    }
    best
}

/// Time interval of one run, flattened out of its track
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RunSpan {
    start: i64,
    end: i64,
    track_index: usize,
    run_index: usize,
}

impl RunSpan {
    #[inline]
    fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    #[inline]
    fn locate(timestamp: &i64, span: &RunSpan) -> Ordering {
        if *timestamp < span.start {
            Ordering::Less
        } else if *timestamp > span.end {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

/// Sorted run intervals of a set of tracks, for O(log n) run lookup
///
/// Gives exactly the same answers as [`find_track_and_run_at`]. Building requires that the
/// runs of all tracks, taken in order, never overlap: this holds within a track by
/// construction, but tracks recorded concurrently may interleave.
#[derive(Clone, Debug, Default)]
pub struct RunTimeline {
    spans: Vec<RunSpan>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RunTimeline {
    /// Build the timeline, failing if the runs of consecutive tracks overlap in time
    pub fn new(tracks: &[Track]) -> Result<Self> {
        let run_count: usize = tracks.iter().map(|track| track.runs().len()).sum();
        let mut spans: Vec<RunSpan> = Vec::with_capacity(run_count);

        for (track_index, track) in tracks.iter().enumerate() {
            for (run_index, run) in track.runs().iter().enumerate() {
                let span = RunSpan {
                    start: run.start_timestamp(),
                    end: run.end_timestamp(),
                    track_index,
                    run_index,
                };
                if let Some(previous) = spans.last() {
                    if span.start < previous.end {
                        return Err(DataError::InvalidInput(format!(
                            "track {track_index} run {run_index} starts at {} before track {} run {} ends at {}",
                            span.start, previous.track_index, previous.run_index, previous.end
                        )));
                    }
                }
                spans.push(span);
            }
        }

        Ok(Self { spans })
    }

    /// Number of runs in the timeline
    #[inline]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Locate the run containing `timestamp` as `(track_index, run_index)`
    pub fn locate(&self, timestamp: i64) -> Option<(usize, usize)> {
        let mut index = sorted_search::search_by(&self.spans, &timestamp, RunSpan::locate).ok()?;

        // Touching runs share a boundary; the earliest one wins
        while index > 0 && self.spans[index - 1].contains(timestamp) {
            index -= 1;
        }

        let span = &self.spans[index];
        Some((span.track_index, span.run_index))
    }

    /// Same as [`find_track_and_run_at`], for the tracks this timeline was built from
    pub fn find<'a>(&self, tracks: &'a [Track], timestamp: i64) -> Option<TrackAndRun<'a>> {
        let (track_index, run_index) = self.locate(timestamp)?;
        let track = tracks.get(track_index)?;
        let run = track.runs().get(run_index)?;
        Some(TrackAndRun {
            track,
            run,
            track_index,
            run_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimezoneInfo;

    fn run(points: &[(f64, f64, i64)]) -> Run {
        let points = points
            .iter()
            .map(|&(lat, lon, ts)| GpxPoint::new(Coordinate::new(lat, lon), ts, 0.0))
            .collect();
        Run::new(points, TimezoneInfo::default()).unwrap()
    }

    /// Two tracks: [0..1000] [2000..3000] | [5000..6000] [6000..7000]
    fn create_test_tracks() -> Vec<Track> {
        let t1 = Track::new(vec![
            run(&[(0.0, 0.0, 0), (0.0, 0.001, 500), (0.0, 0.002, 1000)]),
            run(&[(0.0, 0.003, 2000), (0.0, 0.004, 3000)]),
        ])
        .unwrap();
        let t2 = Track::new(vec![
            run(&[(1.0, 0.0, 5000), (1.0, 0.001, 6000)]),
            run(&[(1.0, 0.002, 6000), (1.0, 0.003, 7000)]),
        ])
        .unwrap();
        vec![t1, t2]
    }

    #[test]
    fn test_find_track_and_run_inside() {
        let tracks = create_test_tracks();
        let found = find_track_and_run_at(&tracks, 2500).unwrap();
        assert_eq!((found.track_index, found.run_index), (0, 1));
        assert!(std::ptr::eq(found.run, &tracks[0].runs()[1]));
        assert!(std::ptr::eq(found.track, &tracks[0]));
    }

    #[test]
    fn test_find_track_and_run_inclusive_bounds() {
        let tracks = create_test_tracks();
        let start = find_track_and_run_at(&tracks, 0).unwrap();
        assert_eq!((start.track_index, start.run_index), (0, 0));
        let end = find_track_and_run_at(&tracks, 1000).unwrap();
        assert_eq!((end.track_index, end.run_index), (0, 0));
        let last = find_track_and_run_at(&tracks, 7000).unwrap();
        assert_eq!((last.track_index, last.run_index), (1, 1));
    }

    #[test]
    fn test_find_track_and_run_in_gap() {
        let tracks = create_test_tracks();
        assert!(find_track_and_run_at(&tracks, 1500).is_none());
        assert!(find_track_and_run_at(&tracks, 4000).is_none());
        assert!(find_track_and_run_at(&tracks, -1).is_none());
        assert!(find_track_and_run_at(&tracks, 7001).is_none());
        assert!(find_track_and_run_at(&[], 0).is_none());
    }

    #[test]
    fn test_shared_boundary_resolves_to_first_run() {
        let tracks = create_test_tracks();
        let found = find_track_and_run_at(&tracks, 6000).unwrap();
        assert_eq!((found.track_index, found.run_index), (1, 0));
    }

    #[test]
    fn test_find_track_and_run_by_point() {
        let tracks = create_test_tracks();
        let probe = GpxPoint::new(Coordinate::new(50.0, 50.0), 5500, 0.0);
        let found = find_track_and_run(&tracks, &probe).unwrap();
        assert_eq!((found.track_index, found.run_index), (1, 0));
    }

    #[test]
    fn test_find_nearest_point_returns_reference() {
        let r = run(&[(0.0, 0.0, 0), (0.0, 1.0, 1000), (0.0, 2.0, 2000)]);
        let nearest = find_nearest_point(&r, 0.1, 1.1).unwrap();
        assert!(std::ptr::eq(nearest, &r.points()[1]));
    }

    #[test]
    fn test_find_nearest_point_tie_first_seen_wins() {
        // Query sits exactly halfway between the two points
        let r = run(&[(0.0, -1.0, 0), (0.0, 1.0, 1000)]);
        let nearest = find_nearest_point(&r, 0.0, 0.0).unwrap();
        assert!(std::ptr::eq(nearest, &r.points()[0]));

        // Duplicated coordinates: the earlier point wins
        let r = run(&[(0.0, 5.0, 0), (0.0, 1.0, 1000), (0.0, 1.0, 2000)]);
        let (index, distance) = find_nearest_point_index(&r, Coordinate::new(0.0, 1.0)).unwrap();
        assert_eq!(index, 1);
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn test_find_nearest_point_single_point() {
        let r = run(&[(10.0, 10.0, 0)]);
        let nearest = find_nearest_point(&r, -10.0, -170.0).unwrap();
        assert_eq!(nearest.timestamp(), 0);
    }

    #[test]
    fn test_queries_are_idempotent() {
        let tracks = create_test_tracks();
        let r = &tracks[0].runs()[0];
        let a = find_nearest_point(r, 0.0, 0.0011).map(|p| p as *const RunPoint);
        let b = find_nearest_point(r, 0.0, 0.0011).map(|p| p as *const RunPoint);
        assert_eq!(a, b);

        let x = find_track_and_run_at(&tracks, 2500).map(|f| (f.track_index, f.run_index));
        let y = find_track_and_run_at(&tracks, 2500).map(|f| (f.track_index, f.run_index));
        assert_eq!(x, y);
    }

    #[test]
    fn test_timeline_matches_linear_scan() {
        let tracks = create_test_tracks();
        let timeline = RunTimeline::new(&tracks).unwrap();
        assert_eq!(timeline.len(), 4);

        for timestamp in (-500..7500).step_by(50) {
            let linear = find_track_and_run_at(&tracks, timestamp)
                .map(|f| (f.track_index, f.run_index));
            let indexed = timeline
                .find(&tracks, timestamp)
                .map(|f| (f.track_index, f.run_index));
            assert_eq!(linear, indexed, "mismatch at {timestamp}");
        }
    }

    #[test]
    fn test_timeline_walks_back_over_zero_length_runs() {
        let track = Track::new(vec![
            run(&[(0.0, 0.0, 0), (0.0, 0.0, 100)]),
            run(&[(0.0, 0.0, 100)]),
            run(&[(0.0, 0.0, 100), (0.0, 0.0, 200)]),
            run(&[(0.0, 0.0, 200), (0.0, 0.0, 300)]),
        ])
        .unwrap();
        let tracks = vec![track];
        let timeline = RunTimeline::new(&tracks).unwrap();
        assert_eq!(timeline.locate(100), Some((0, 0)));
        assert_eq!(timeline.locate(200), Some((0, 2)));
        assert_eq!(timeline.locate(250), Some((0, 3)));
    }

    #[test]
    fn test_timeline_rejects_interleaved_tracks() {
        let t1 = Track::new(vec![run(&[(0.0, 0.0, 0), (0.0, 0.0, 1000)])]).unwrap();
        let t2 = Track::new(vec![run(&[(0.0, 0.0, 500), (0.0, 0.0, 1500)])]).unwrap();
        let result = RunTimeline::new(&[t1, t2]);
        assert!(matches!(result, Err(DataError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_timeline() {
        let timeline = RunTimeline::new(&[]).unwrap();
        assert!(timeline.is_empty());
        assert_eq!(timeline.locate(0), None);
    }
}
