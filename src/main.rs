mod report;
mod settings;

use clap::Parser;
use gpx_track_lib::summary::{PointDetails, RunSummary};
use gpx_track_lib::{Coordinate, TrackCollection, TrackAndRun, geo_math};
use settings::Settings;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::parse();
    match inspect(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn inspect(settings: &Settings) -> gpx_track_lib::Result<()> {
    profiling::scope!("inspect");

    let mut collection = TrackCollection::new(settings.config());
    let added = collection.load_from_files(&settings.gpx_files)?;
    tracing::info!(
        "Loaded {added} tracks from {} files (timeline lookup: {})",
        settings.gpx_files.len(),
        collection.uses_timeline()
    );

    let Some(overview) = collection.overview() else {
        println!("No recorded points");
        println!("{}", report::discarded_count(collection.get_info().discarded_count));
        return Ok(());
    };
    report::overview(&overview).iter().for_each(|line| println!("{line}"));

    if settings.runs {
        for (track_index, track) in collection.tracks().iter().enumerate() {
            let pauses = track.pauses();
            for (run_index, run) in track.runs().iter().enumerate() {
                let summary = RunSummary::new(track_index + 1, run_index + 1, run);
                println!("{}", report::run(&summary));
                if let Some(pause) = pauses.get(run_index) {
                    println!("{}", report::pause(pause));
                }
            }
            for point in track.discarded() {
                println!("{}", report::discarded(track_index + 1, point));
            }
        }
    }

    let active = settings.at.map(|timestamp| {
        let found = collection.find_track_and_run_at(timestamp);
        match found {
            Some(found) => println!(
                "At {}: track {} run {}",
                report::format_timestamp(timestamp),
                found.track_index + 1,
                found.run_index + 1
            ),
            None => println!("At {}: not recording", report::format_timestamp(timestamp)),
        }
        found
    });

    if let Some(target) = settings.near {
        // Restrict to the active run when a time was given
        let candidates: Vec<TrackAndRun<'_>> = match active {
            Some(found) => found.into_iter().collect(),
            None => all_runs(&collection),
        };
        match nearest(&collection, &candidates, target) {
            Some((found, index)) => {
                let point = &found.run.points()[index];
                println!(
                    "Nearest point: track {} run {} point {}",
                    found.track_index + 1,
                    found.run_index + 1,
                    index + 1
                );
                report::point(&PointDetails::new(found.run, point))
                    .iter()
                    .for_each(|line| println!("  {line}"));
            }
            None => println!("No point near {:.6},{:.6}", target.latitude, target.longitude),
        }
    }

    Ok(())
}

fn all_runs(collection: &TrackCollection) -> Vec<TrackAndRun<'_>> {
    collection
        .tracks()
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
        .collect()
}

/// Closest point over `candidates`, as the run and the point index within it
fn nearest<'a>(
    collection: &TrackCollection,
    candidates: &[TrackAndRun<'a>],
    target: Coordinate,
) -> Option<(TrackAndRun<'a>, usize)> {
    let mut best: Option<(TrackAndRun<'a>, usize, f64)> = None;
    for candidate in candidates {
        let Some(point) = collection.find_nearest_point(
            candidate.track_index,
            candidate.run_index,
            target.latitude,
            target.longitude,
        ) else {
            continue;
        };
        let distance = geo_math::distance_meters(point.coordinate(), target);
        if best.as_ref().is_none_or(|(_, _, d)| distance < *d) {
            let index = candidate
                .run
                .points()
                .iter()
                .position(|p| std::ptr::eq(p, point))?;
            best = Some((*candidate, index, distance));
        }
    }
    best.map(|(found, index, _)| (found, index))
}
