//! Performance benchmarks for gpx-track-lib
//!
//! Run with: cargo bench --package gpx-track-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::Point;
use gpx::{Gpx, Track, TrackSegment, Waypoint};
use gpx_track_lib::track_index;
use gpx_track_lib::{
    Config, Coordinate, LatitudeIndex, LookupStrategy, RunTimeline, TrackCollection,
    par_find_nearest_points,
};
use std::time::Duration;
use time::OffsetDateTime;

/// Generate a realistic GPX track with one point per second, split by a pause every
/// `run_length` points.
fn generate_gpx_track(
    num_points: usize,
    run_length: usize,
    base_lat: f64,
    base_lon: f64,
    start: i64,
) -> Gpx {
    let mut gpx = Gpx::default();
    let mut track = Track::default();
    let mut segment = TrackSegment::default();
    let mut seconds = start;

    for i in 0..num_points {
        let t = i as f64 / num_points as f64;
        let lat = base_lat + t * 0.1 + (t * 50.0).sin() * 0.001;
        let lon = base_lon + t * 0.1 + (t * 30.0).cos() * 0.001;
        let mut waypoint = Waypoint::new(Point::new(lon, lat));
        seconds += if i > 0 && i % run_length == 0 { 600 } else { 1 };
        waypoint.time = OffsetDateTime::from_unix_timestamp(seconds).ok().map(Into::into);
        segment.points.push(waypoint);
    }

    track.segments.push(segment);
    gpx.tracks.push(track);
    gpx
}

/// Generate consecutive GPX tracks spread across an area
fn generate_multiple_tracks(num_tracks: usize, points_per_track: usize) -> Vec<Gpx> {
    (0..num_tracks)
        .map(|i| {
            let lat_offset = (i % 10) as f64 * 0.1;
            let lon_offset = (i / 10) as f64 * 0.1;
            let start = i as i64 * 1_000_000;
            generate_gpx_track(points_per_track, 100, 51.5 + lat_offset, -0.1 + lon_offset, start)
        })
        .collect()
}

fn create_collection(gpx: &[Gpx], lookup: LookupStrategy) -> TrackCollection {
    let config = Config {
        split_gap: Some(Duration::from_secs(60)),
        lookup,
        ..Config::default()
    };
    let mut collection = TrackCollection::new(config);
    collection.add_gpx_parallel(gpx).unwrap();
    collection
}

fn create_query_grid(n: usize) -> Vec<Coordinate> {
    (0..n * n)
        .map(|i| {
            Coordinate::new(
                51.45 + (i / n) as f64 * 0.2 / n as f64,
                -0.15 + (i % n) as f64 * 0.2 / n as f64,
            )
        })
        .collect()
}

// ============================================================================
// Core Benchmarks - Key performance indicators
// ============================================================================

fn bench_nearest_point(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_point");

    for num_points in [1_000, 50_000] {
        let gpx = generate_gpx_track(num_points, num_points, 51.5, -0.1, 0);
        let collection = create_collection(&[gpx], LookupStrategy::Timeline);
        let run = &collection.tracks()[0].runs()[0];
        let index = LatitudeIndex::new(run);
        let query = Coordinate::new(51.55, -0.05);

        group.bench_with_input(BenchmarkId::new("linear", num_points), &query, |b, q| {
            b.iter(|| track_index::find_nearest_point(run, q.latitude, q.longitude));
        });
        group.bench_with_input(BenchmarkId::new("latitude_index", num_points), &query, |b, q| {
            b.iter(|| index.nearest_point(run, *q));
        });
    }

    group.finish();
}

fn bench_batch_nearest_points(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_nearest_points");
    group.sample_size(20);

    let gpx = generate_gpx_track(50_000, 50_000, 51.5, -0.1, 0);
    let collection = create_collection(&[gpx], LookupStrategy::Timeline);
    let run = &collection.tracks()[0].runs()[0];
    let index = LatitudeIndex::new(run);
    let queries = create_query_grid(32);

    group.throughput(Throughput::Elements(queries.len() as u64));
    group.bench_function("parallel_linear_1k_queries", |b| {
        b.iter(|| par_find_nearest_points(run, &queries));
    });
    group.bench_function("parallel_index_1k_queries", |b| {
        b.iter(|| index.par_nearest_points(run, &queries));
    });

    group.finish();
}

fn bench_run_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_lookup");

    // 100 tracks of 10k points, 100 runs each
    let tracks = generate_multiple_tracks(100, 10_000);
    let linear = create_collection(&tracks, LookupStrategy::Linear);
    let timeline = create_collection(&tracks, LookupStrategy::Timeline);
    assert!(timeline.uses_timeline());

    // Late in the last track, the worst case for a scan
    let timestamp = 99_000_000_000 + 5_000_000;

    group.bench_function("linear_10k_runs", |b| {
        b.iter(|| linear.find_track_and_run_at(timestamp));
    });
    group.bench_function("timeline_10k_runs", |b| {
        b.iter(|| timeline.find_track_and_run_at(timestamp));
    });

    group.finish();
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");
    group.sample_size(20);

    let tracks = generate_multiple_tracks(50, 1_000);
    let total_points = 50 * 1_000;

    group.throughput(Throughput::Elements(total_points as u64));
    group.bench_function("parallel_50x1k", |b| {
        b.iter(|| create_collection(&tracks, LookupStrategy::Timeline));
    });

    let collection = create_collection(&tracks, LookupStrategy::Linear);
    group.bench_function("timeline_5k_runs", |b| {
        b.iter(|| RunTimeline::new(collection.tracks()).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_nearest_point,
    bench_batch_nearest_points,
    bench_run_lookup,
    bench_construction,
);
criterion_main!(benches);
