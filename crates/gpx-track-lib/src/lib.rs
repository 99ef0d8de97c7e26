//! GPX Track Library - Time and Position Queries over Recorded Tracks
//!
//! This library holds the analysis layer behind a map-based GPX viewer. Decoded GPX data is
//! organized into tracks made of runs (contiguous recordings) made of points, and can then be
//! queried by timestamp (which run was active?) and by position (which recorded point is
//! closest to where the user clicked?).
//!
//! # Architecture
//!
//! - **[`geo_math`]**: Haversine distance, unit conversions and display rounding
//! - **[`sorted_search`]**: Comparator-driven binary search over sorted slices
//! - **[`Run`] / [`Track`]**: Immutable, validated point hierarchy with cumulative offsets
//! - **[`track_index`]**: Run lookup by time and nearest-point lookup by position
//! - **[`LatitudeIndex`]**: Optional sorted index that prunes nearest-point scans
//! - **[`TrackCollection`]**: High-level manager tying ingestion, indices and queries together
//! - **[`summary`]**: Plain numeric records for presentation code
//!
//! # Performance Characteristics
//!
//! - **Run lookup**: O(R) linear scan, or O(log R) through [`RunTimeline`]
//! - **Nearest point**: O(N) linear scan, typically O(log N + K) through [`LatitudeIndex`]
//! - **Memory**: O(N) for points + O(N) per latitude index
//!
//! All structures are read-only once built, so every query can run from any number of threads.

mod collection;
pub mod geo_math;
mod point;
mod run;
pub mod sorted_search;
mod spatial;
pub mod summary;
pub mod track_index;

// Public API exports
pub use collection::{CollectionInfo, Config, LookupStrategy, TrackCollection};
pub use geo_math::Coordinate;
pub use point::{DiscardReason, DiscardedPoint, GpxPoint, RunPoint};
pub use run::{Run, TimezoneInfo, Track};
pub use spatial::{LatitudeIndex, par_find_nearest_points};
pub use track_index::{RunTimeline, TrackAndRun};

/// Error types for building and loading tracks
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Empty run")]
    EmptyRun,

    #[error("Point {index} has no timestamp")]
    MissingTimestamp { index: usize },

    #[error("Timestamps decrease at point {index}: {previous} > {current}")]
    NonMonotonicTimestamps {
        index: usize,
        previous: i64,
        current: i64,
    },

    #[error("Run {index} starts at {start} before the previous run ends at {previous_end}")]
    OverlappingRuns {
        index: usize,
        previous_end: i64,
        start: i64,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, DataError>;
