//! TrackCollection - Top-level manager for tracks, lookup indices, and queries
//!
//! This module provides the high-level API for loading decoded GPX data, keeping the
//! time and position indices in sync with it, and answering lookups.

use crate::summary::Overview;
use crate::track_index::{self, TrackAndRun};
use crate::{
    Coordinate, GpxPoint, LatitudeIndex, Result, RunPoint, RunTimeline, TimezoneInfo, Track,
};

use geo::Rect;
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How [`TrackCollection`] answers run lookups by timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LookupStrategy {
    /// Scan every run in order
    Linear,
    /// Binary search over a [`RunTimeline`], falling back to a scan when tracks interleave
    #[default]
    Timeline,
}

/// Configuration for the track collection
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Split a GPX segment into separate runs wherever consecutive points are further apart
    /// in time than this. `None` keeps one run per segment.
    pub split_gap: Option<Duration>,
    /// Timezone labels attached to every loaded run
    pub timezone: TimezoneInfo,
    /// Run lookup strategy
    pub lookup: LookupStrategy,
    /// Runs with at least this many points get a [`LatitudeIndex`] for nearest-point queries.
    /// Shorter runs are scanned linearly.
    pub spatial_index_min_points: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            split_gap: None,
            timezone: TimezoneInfo::default(),
            lookup: LookupStrategy::default(),
            spatial_index_min_points: 1024,
        }
    }
}

/// Information about the track collection
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollectionInfo {
    /// Number of tracks loaded
    pub track_count: usize,
    /// Number of runs across all tracks
    pub run_count: usize,
    /// Total number of track points
    pub total_points: usize,
    /// Total distance in meters (pauses between runs excluded)
    pub total_distance_meters: f64,
    /// Waypoints left out of every run
    pub discarded_count: usize,
}

/// Cached statistics for the collection
///
/// These are updated incrementally when tracks are added.
#[derive(Debug, Clone, Default)]
struct CachedStats {
    run_count: usize,
    total_points: usize,
    total_distance_meters: f64,
    discarded_count: usize,
    /// Combined bounds in degrees (None if empty)
    bounding_box: Option<Rect<f64>>,
}

/// Top-level manager for all tracks and queries
#[derive(Clone, Debug)]
pub struct TrackCollection {
    /// All loaded tracks, in load order
    tracks: Vec<Track>,
    /// Configuration settings
    config: Config,
    /// Flattened run intervals, `None` when tracks interleave in time
    timeline: Option<RunTimeline>,
    /// Per track, per run latitude index (only for runs long enough)
    latitude_indices: Vec<Vec<Option<LatitudeIndex>>>,
    /// Cached statistics (incrementally updated)
    cached_stats: CachedStats,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TrackCollection {
    /// Create a new track collection with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            tracks: Vec::new(),
            config,
            timeline: Some(RunTimeline::default()),
            latitude_indices: Vec::new(),
            cached_stats: CachedStats::default(),
        }
    }

    /// Add an already built track
    ///
    /// A track with neither runs nor discarded points is ignored.
    ///
    /// # Returns
    /// Whether the track was added
    pub fn add_track(&mut self, track: Track) -> bool {
        if is_blank(&track) {
            tracing::warn!("Skipping track without points");
            return false;
        }
        self.push_track(track);
        self.rebuild_timeline();
        true
    }

    /// Add every track of a decoded GPX document
    ///
    /// Tracks without any points are skipped. Tracks whose points were all discarded are kept
    /// so the discards can still be reported.
    ///
    /// # Returns
    /// The number of tracks added
    pub fn add_gpx(&mut self, gpx_data: &gpx::Gpx) -> Result<usize> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::add_gpx");

        let tracks = self.convert_gpx(gpx_data)?;
        let added = tracks.len();
        for track in tracks {
            self.push_track(track);
        }
        self.rebuild_timeline();
        Ok(added)
    }

    /// Add multiple decoded GPX documents, converting them in parallel
    ///
    /// Tracks keep the order of `gpx_data_vec`. Nothing is added if any document fails.
    pub fn add_gpx_parallel(&mut self, gpx_data_vec: &[gpx::Gpx]) -> Result<usize> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::add_gpx_parallel");

        let converted: Result<Vec<Vec<Track>>> = gpx_data_vec
            .par_iter()
            .map(|gpx_data| self.convert_gpx(gpx_data))
            .collect();

        let mut added = 0;
        for tracks in converted? {
            added += tracks.len();
            for track in tracks {
                self.push_track(track);
            }
        }
        self.rebuild_timeline();
        Ok(added)
    }

    /// Load tracks from GPX files in parallel
    pub fn load_from_files<P: AsRef<Path> + Send + Sync>(
        &mut self,
        paths: &[P],
    ) -> Result<usize> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::load_from_files");

        let gpx_data_vec: Result<Vec<gpx::Gpx>> = paths
            .par_iter()
            .map(|path| {
                tracing::debug!("Reading {}", path.as_ref().display());
                let file = std::fs::File::open(path.as_ref())?;
                let reader = std::io::BufReader::new(file);
                Ok(gpx::read(reader)?)
            })
            .collect();

        self.add_gpx_parallel(&gpx_data_vec?)
    }

    /// Find the run that was recording at `timestamp` (epoch milliseconds)
    ///
    /// Same answer as [`track_index::find_track_and_run_at`] over [`Self::tracks`], whichever
    /// [`LookupStrategy`] is configured.
    pub fn find_track_and_run_at(&self, timestamp: i64) -> Option<TrackAndRun<'_>> {
        let found = match (&self.config.lookup, &self.timeline) {
            (LookupStrategy::Timeline, Some(timeline)) => timeline.find(&self.tracks, timestamp),
            _ => track_index::find_track_and_run_at(&self.tracks, timestamp),
        };
        tracing::trace!(
            "Run lookup at {timestamp}: {:?}",
            found.map(|f| (f.track_index, f.run_index))
        );
        found
    }

    /// Find the run that was recording when `point` was taken
    #[inline]
    pub fn find_track_and_run(&self, point: &GpxPoint) -> Option<TrackAndRun<'_>> {
        self.find_track_and_run_at(point.timestamp)
    }

    /// Find the point of a run closest to (`lat`, `lon`)
    ///
    /// Returns `None` if the track or run index is out of range.
    pub fn find_nearest_point(
        &self,
        track_index: usize,
        run_index: usize,
        lat: f64,
        lon: f64,
    ) -> Option<&RunPoint> {
        let run = self.tracks.get(track_index)?.runs().get(run_index)?;
        let index = self
            .latitude_indices
            .get(track_index)
            .and_then(|runs| runs.get(run_index))
            .and_then(Option::as_ref);

        match index {
            Some(index) => index.nearest_point(run, Coordinate::new(lat, lon)),
            None => track_index::find_nearest_point(run, lat, lon),
        }
    }

    /// Get total number of tracks
    #[inline]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Get total number of points across all tracks
    ///
    /// This is O(1) as the value is cached and updated incrementally.
    #[inline]
    pub fn total_points(&self) -> usize {
        self.cached_stats.total_points
    }

    /// Get total distance across all tracks in meters
    #[inline]
    pub fn total_distance(&self) -> f64 {
        self.cached_stats.total_distance_meters
    }

    /// Get collection information
    ///
    /// This is O(1) as all values are cached.
    #[inline]
    pub fn get_info(&self) -> CollectionInfo {
        CollectionInfo {
            track_count: self.tracks.len(),
            run_count: self.cached_stats.run_count,
            total_points: self.cached_stats.total_points,
            total_distance_meters: self.cached_stats.total_distance_meters,
            discarded_count: self.cached_stats.discarded_count,
        }
    }

    /// Collection-wide overview, `None` when empty
    #[inline]
    pub fn overview(&self) -> Option<Overview> {
        Overview::new(&self.tracks)
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a reference to a specific track by index
    #[inline]
    pub fn get_track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Get all tracks
    #[inline]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Check if the collection is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Whether run lookups currently go through the timeline
    #[inline]
    pub fn uses_timeline(&self) -> bool {
        self.config.lookup == LookupStrategy::Timeline && self.timeline.is_some()
    }

    /// Clear all tracks from the collection
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.latitude_indices.clear();
        self.timeline = Some(RunTimeline::default());
        self.cached_stats = CachedStats::default();
    }

    /// Get the combined bounding box of all tracks in degrees (x = longitude, y = latitude)
    ///
    /// Returns `None` if there are no tracks loaded.
    #[inline]
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        self.cached_stats.bounding_box
    }

    /// Get the center of all tracks as (latitude, longitude)
    #[inline]
    pub fn center(&self) -> Option<(f64, f64)> {
        self.bounding_box().map(|bbox| {
            let center = bbox.center();
            (center.y, center.x)
        })
    }

    fn convert_gpx(&self, gpx_data: &gpx::Gpx) -> Result<Vec<Track>> {
        let mut tracks = Vec::with_capacity(gpx_data.tracks.len());
        for (index, gpx_track) in gpx_data.tracks.iter().enumerate() {
            let track =
                Track::from_gpx_track(gpx_track, &self.config.timezone, self.config.split_gap)?;
            if is_blank(&track) {
                tracing::warn!("Skipping GPX track {index} without points");
                continue;
            }
            if track.is_empty() {
                tracing::warn!("Every point of GPX track {index} was discarded");
            }
            tracks.push(track);
        }
        Ok(tracks)
    }

    /// Store a track with its indices and update cached statistics
    fn push_track(&mut self, track: Track) {
        let indices = track
            .runs()
            .iter()
            .map(|run| {
                (run.len() >= self.config.spatial_index_min_points).then(|| LatitudeIndex::new(run))
            })
            .collect();

        self.cached_stats.run_count += track.runs().len();
        self.cached_stats.total_points += track.total_points();
        self.cached_stats.total_distance_meters += track.kilometers() * 1000.0;
        self.cached_stats.discarded_count += track.discarded().len();

        for run in track.runs() {
            let run_bbox = run.bounds();
            match &mut self.cached_stats.bounding_box {
                Some(bbox) => {
                    *bbox = Rect::new(
                        geo::Coord {
                            x: bbox.min().x.min(run_bbox.min().x),
                            y: bbox.min().y.min(run_bbox.min().y),
                        },
                        geo::Coord {
                            x: bbox.max().x.max(run_bbox.max().x),
                            y: bbox.max().y.max(run_bbox.max().y),
                        },
                    );
                }
                None => {
                    self.cached_stats.bounding_box = Some(run_bbox);
                }
            }
        }

        tracing::debug!(
            "Added track {} with {} runs and {} points",
            self.tracks.len(),
            track.runs().len(),
            track.total_points()
        );
        self.latitude_indices.push(indices);
        self.tracks.push(track);
    }

    fn rebuild_timeline(&mut self) {
        self.timeline = match RunTimeline::new(&self.tracks) {
            Ok(timeline) => Some(timeline),
            Err(e) => {
                tracing::warn!("Run timeline unavailable, falling back to linear lookup: {e}");
                None
            }
        };
    }
}

/// No runs and nothing discarded
fn is_blank(track: &Track) -> bool {
    track.is_empty() && track.discarded().is_empty()
}
