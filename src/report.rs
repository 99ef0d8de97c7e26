//! Text rendering of the library's summary records

use gpx_track_lib::geo_math::{displayable_distance, displayable_duration};
use gpx_track_lib::DiscardedPoint;
use gpx_track_lib::summary::{Overview, Pause, PointDetails, RunSummary};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// RFC 3339 in UTC, or the raw milliseconds when out of range
pub fn format_timestamp(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|date_time| date_time.format(&Rfc3339).ok())
        .unwrap_or_else(|| format!("{millis} ms"))
}

fn duration_between(start: i64, end: i64) -> String {
    displayable_duration(u64::try_from(end - start).unwrap_or(0))
}

pub fn overview(overview: &Overview) -> Vec<String> {
    vec![
        format!(
            "{} tracks, {} runs, {} points",
            overview.track_count, overview.run_count, overview.total_points
        ),
        format!(
            "From {} to {} ({})",
            format_timestamp(overview.start_timestamp),
            format_timestamp(overview.end_timestamp),
            overview.timezone.tag
        ),
        format!(
            "Distance: {} km / {} mi",
            displayable_distance(overview.total_kilometers),
            displayable_distance(overview.total_miles)
        ),
        format!(
            "Moving: {}, paused: {}",
            displayable_duration((overview.moving_seconds * 1000.0).round() as u64),
            displayable_duration(overview.paused_ms)
        ),
        discarded_count(overview.discarded_count),
    ]
}

pub fn discarded_count(count: usize) -> String {
    match count {
        0 => "No points were discarded".to_string(),
        1 => "1 point was discarded".to_string(),
        n => format!("{n} points were discarded"),
    }
}

pub fn discarded(track_number: usize, point: &DiscardedPoint) -> String {
    let time = point
        .timestamp
        .map(format_timestamp)
        .unwrap_or_else(|| "no time".to_string());
    format!(
        "  Discarded in track {} segment {} point {}: {} ({}) at {:.6},{:.6}, fix: {}, HDOP: {}, PDOP: {}",
        track_number,
        point.segment + 1,
        point.index + 1,
        point.reason,
        time,
        point.coordinate.latitude,
        point.coordinate.longitude,
        point.fix.as_deref().unwrap_or(""),
        point.hdop,
        point.pdop
    )
}

pub fn run(summary: &RunSummary) -> String {
    format!(
        "Track {} Run {}: {} ({}), {} km / {} mi in {}, avg {} mph, {} points",
        summary.track_number,
        summary.run_number,
        format_timestamp(summary.start_timestamp),
        summary.timezone.tag,
        displayable_distance(summary.kilometers),
        displayable_distance(summary.miles),
        duration_between(summary.start_timestamp, summary.end_timestamp),
        displayable_distance(summary.average_speed_mph),
        summary.point_count
    )
}

pub fn pause(pause: &Pause) -> String {
    format!(
        "  Pause after run {}: {} at {:.5},{:.5}, {} m to the next run",
        pause.after_run + 1,
        displayable_duration(pause.duration_ms),
        pause.coordinate.latitude,
        pause.coordinate.longitude,
        displayable_distance(pause.distance_meters)
    )
}

pub fn point(details: &PointDetails) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Point at {:.6},{:.6} recorded {}",
            details.coordinate.latitude,
            details.coordinate.longitude,
            format_timestamp(details.timestamp)
        ),
        format!(
            "Distance: {} km / {} mi, time: {}",
            displayable_distance(details.kilometers_from_start),
            displayable_distance(details.miles_from_start),
            displayable_duration(details.milliseconds_from_start)
        ),
        format!(
            "Speed: {} mph, HDOP: {}, PDOP: {}",
            displayable_distance(details.speed_mph),
            details.hdop,
            details.pdop
        ),
    ];
    if let Some(fix) = &details.fix {
        lines.push(format!("Fix: {fix}"));
    }
    if let Some(bearing) = details.bearing_degrees {
        lines.push(format!("Bearing: {bearing:.0}°"));
    }
    lines.push(format!(
        "Run: {} km / {} mi in {}",
        displayable_distance(details.run_kilometers),
        displayable_distance(details.run_miles),
        displayable_duration((details.run_seconds * 1000.0).round() as u64)
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpx_track_lib::{Coordinate, DiscardReason, GpxPoint, Run, TimezoneInfo, Track};

    fn create_test_track() -> Track {
        let run = |start: i64| {
            let points = (0..4)
                .map(|i| {
                    GpxPoint::new(
                        Coordinate::new(0.0, i as f64 * 0.01),
                        start + i * 60_000,
                        20.0,
                    )
                })
                .collect();
            Run::new(points, TimezoneInfo::new("Europe/Madrid", "CET")).unwrap()
        };
        Track::new(vec![run(0), run(600_000)]).unwrap()
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_timestamp(1500), "1970-01-01T00:00:01.5Z");
        assert_eq!(format_timestamp(i64::MAX), format!("{} ms", i64::MAX));
    }

    #[test]
    fn test_run_line() {
        let track = create_test_track();
        let line = run(&RunSummary::new(1, 2, &track.runs()[1]));
        assert!(line.starts_with("Track 1 Run 2: 1970-01-01T00:10:00Z (CET)"));
        assert!(line.contains("in 3:00"));
        assert!(line.ends_with("4 points"));
    }

    #[test]
    fn test_pause_line() {
        let track = create_test_track();
        let pauses = track.pauses();
        let line = pause(&pauses[0]);
        assert!(line.contains("Pause after run 1: 7:00"));
    }

    #[test]
    fn test_point_lines() {
        let track = create_test_track();
        let r = &track.runs()[0];
        let lines = point(&PointDetails::new(r, &r.points()[0]));
        assert_eq!(lines[0], "Point at 0.000000,0.000000 recorded 1970-01-01T00:00:00Z");
        assert_eq!(lines[1], "Distance: 0.000 km / 0.000 mi, time: 0:00");
        // First point of a run has no bearing
        assert!(lines.iter().all(|line| !line.starts_with("Bearing")));
    }

    #[test]
    fn test_overview_lines() {
        let track = create_test_track();
        let lines = overview(&Overview::new(std::slice::from_ref(&track)).unwrap());
        assert_eq!(lines[0], "1 tracks, 2 runs, 8 points");
        assert!(lines[1].ends_with("(CET)"));
        assert_eq!(lines[3], "Moving: 6:00, paused: 7:00");
        assert_eq!(lines[4], "No points were discarded");
    }

    #[test]
    fn test_discarded_lines() {
        assert_eq!(discarded_count(1), "1 point was discarded");
        assert_eq!(discarded_count(3), "3 points were discarded");

        let point = DiscardedPoint {
            segment: 0,
            index: 4,
            coordinate: Coordinate::new(40.4, -3.7),
            timestamp: None,
            reason: DiscardReason::MissingTimestamp,
            fix: Some("2d".to_string()),
            hdop: 1.5,
            pdop: 0.0,
        };
        assert_eq!(
            discarded(2, &point),
            "  Discarded in track 2 segment 1 point 5: no timestamp (no time) at 40.400000,-3.700000, fix: 2d, HDOP: 1.5, PDOP: 0"
        );
    }
}
