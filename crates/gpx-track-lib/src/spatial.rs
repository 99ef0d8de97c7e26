//! Latitude-sorted index for nearest-point queries on long runs
//!
//! The great-circle distance between two coordinates is never shorter than the meridian arc
//! between their latitudes, `R·|Δlat|`. Sorting points by latitude lets a query start at the
//! query latitude and walk outwards, stopping in each direction once that lower bound exceeds
//! the best distance found so far.

use crate::geo_math::{self, Coordinate, EARTH_RADIUS_METERS};
use crate::sorted_search;
use crate::track_index;
use crate::{Run, RunPoint};
use rayon::prelude::*;

/// Slack added to the pruning bound to absorb floating-point error
const PRUNE_SLACK_METERS: f64 = 1e-6;

/// Point indices of one run, sorted by latitude
///
/// Answers exactly like [`track_index::find_nearest_point`], including returning the earliest
/// point among equidistant ones. Coordinates are assumed finite.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatitudeIndex {
    /// `(latitude, point index)`, ordered by latitude then index
    entries: Vec<(f64, usize)>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl LatitudeIndex {
    /// Build the index for `run`
    pub fn new(run: &Run) -> Self {
        #[cfg(feature = "profiling")]
        profiling::scope!("latitude_index::new");

        let mut entries: Vec<(f64, usize)> = run
            .points()
            .iter()
            .enumerate()
            .map(|(index, point)| (point.coordinate().latitude, index))
            .collect();
        entries.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        Self { entries }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nearest point of `run` (the run this index was built from) to `target`
    #[inline]
    pub fn nearest_point<'a>(&self, run: &'a Run, target: Coordinate) -> Option<&'a RunPoint> {
        let (index, _) = self.nearest_index(run, target)?;
        run.points().get(index)
    }

    /// Index of the nearest point and its distance in meters
    pub fn nearest_index(&self, run: &Run, target: Coordinate) -> Option<(usize, f64)> {
        let points = run.points();
        let pivot = sorted_search::search_by(&self.entries, &target.latitude, |lat: &f64, entry| {
            lat.total_cmp(&entry.0)
        })
        .unwrap_or_else(|insertion| insertion);

        let lower_bound = |latitude: f64| {
            EARTH_RADIUS_METERS * (latitude - target.latitude).abs().to_radians()
        };

        let distance_to = |index: usize| {
            points
                .get(index)
                .map(|point| geo_math::distance_meters(point.coordinate(), target))
        };

        let mut best: Option<(usize, f64)> = None;
        // `up` is the next entry at or above the pivot, `down` one past the next entry below it
        let mut up = pivot;
        let mut down = pivot;
        let len = self.entries.len();

        while up < len || down > 0 {
            let limit = best.map_or(f64::INFINITY, |(_, d)| d + PRUNE_SLACK_METERS);

            if up < len {
                let (latitude, index) = self.entries[up];
                if lower_bound(latitude) > limit {
                    up = len;
                } else {
                    offer(&mut best, index, distance_to(index));
                    up += 1;
                }
            }

            let limit = best.map_or(f64::INFINITY, |(_, d)| d + PRUNE_SLACK_METERS);

            if down > 0 {
                let (latitude, index) = self.entries[down - 1];
                if lower_bound(latitude) > limit {
                    down = 0;
                } else {
                    offer(&mut best, index, distance_to(index));
                    down -= 1;
                }
            }
        }

        best
    }

    /// Nearest point for many queries at once, in parallel
    pub fn par_nearest_points<'a>(
        &self,
        run: &'a Run,
        queries: &[Coordinate],
    ) -> Vec<Option<&'a RunPoint>> {
        queries
            .par_iter()
            .map(|&query| self.nearest_point(run, query))
            .collect()
    }
}

/// Replace `best` when `index` is closer, or equally close and recorded earlier
#[inline]
fn offer(best: &mut Option<(usize, f64)>, index: usize, distance: Option<f64>) {
    let Some(d) = distance else {
        return;
    };
    let better = match *best {
        Some((best_index, best_distance)) => {
            d < best_distance || (d == best_distance && index < best_index)
        }
        None => true,
    };
    if better {
        *best = Some((index, d));
    }
}

/// Linear nearest-point search for many queries at once, in parallel
///
/// Results are in query order.
pub fn par_find_nearest_points<'a>(
    run: &'a Run,
    queries: &[Coordinate],
) -> Vec<Option<&'a RunPoint>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("spatial::par_find_nearest_points");

    queries
        .par_iter()
        .map(|query| track_index::find_nearest_point(run, query.latitude, query.longitude))
        .collect()
}
