use clap::{Parser, ValueEnum};
use gpx_track_lib::{Config, Coordinate, LookupStrategy, TimezoneInfo};
use std::path::PathBuf;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
/// GPX Track Inspector - Query recorded GPS tracks by time and position
pub struct Settings {
    /// GPX files to load
    #[clap(short, long, value_name = "FILE", required = true)]
    pub gpx_files: Vec<PathBuf>,

    /// Split segments into separate runs at pauses longer than this many seconds
    #[clap(short, long, value_name = "SECONDS")]
    pub split_gap_secs: Option<u64>,

    /// Timezone identifier attached to every run
    #[clap(long, default_value = "UTC")]
    pub timezone_id: String,

    /// Short timezone tag shown next to times
    #[clap(long, default_value = "UTC")]
    pub timezone_tag: String,

    /// How runs are looked up by time
    #[clap(long, value_enum, default_value_t = Lookup::Timeline)]
    pub lookup: Lookup,

    /// Runs with at least this many points get a latitude index for nearest-point queries
    #[clap(long, default_value = "1024")]
    pub spatial_index_min_points: usize,

    /// Print a summary line for every run and pause
    #[clap(short, long, default_value = "false")]
    pub runs: bool,

    /// Find the run recording at this time (RFC 3339 or epoch milliseconds)
    #[clap(short, long, value_name = "TIME", value_parser = parse_timestamp)]
    pub at: Option<i64>,

    /// Find the recorded point closest to this position, as `LAT,LON`
    #[clap(short, long, value_name = "LAT,LON", value_parser = parse_coordinate)]
    pub near: Option<Coordinate>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    Linear,
    Timeline,
}

impl From<Lookup> for LookupStrategy {
    fn from(lookup: Lookup) -> Self {
        match lookup {
            Lookup::Linear => LookupStrategy::Linear,
            Lookup::Timeline => LookupStrategy::Timeline,
        }
    }
}

impl Settings {
    /// Library configuration for these settings
    pub fn config(&self) -> Config {
        Config {
            split_gap: self.split_gap_secs.map(Duration::from_secs),
            timezone: TimezoneInfo::new(&self.timezone_id, &self.timezone_tag),
            lookup: self.lookup.into(),
            spatial_index_min_points: self.spatial_index_min_points,
        }
    }
}

/// Errors in argument values clap cannot check by itself
#[derive(Debug, thiserror::Error)]
pub enum ArgError {
    #[error("Invalid time {0:?}: expected RFC 3339 or epoch milliseconds")]
    Timestamp(String),

    #[error("Invalid position {0:?}: expected LAT,LON in decimal degrees")]
    Coordinate(String),
}

/// Parse RFC 3339 or a plain integer of epoch milliseconds
pub fn parse_timestamp(value: &str) -> Result<i64, ArgError> {
    if let Ok(millis) = value.parse::<i64>() {
        return Ok(millis);
    }
    let date_time = OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|_| ArgError::Timestamp(value.to_string()))?;
    i64::try_from(date_time.unix_timestamp_nanos() / 1_000_000)
        .map_err(|_| ArgError::Timestamp(value.to_string()))
}

pub fn parse_coordinate(value: &str) -> Result<Coordinate, ArgError> {
    let invalid = || ArgError::Coordinate(value.to_string());
    let (lat, lon) = value.split_once(',').ok_or_else(invalid)?;
    let latitude: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let longitude: f64 = lon.trim().parse().map_err(|_| invalid())?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(invalid());
    }
    Ok(Coordinate::new(latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1500").unwrap(), 1500);
        assert_eq!(parse_timestamp("1970-01-01T00:00:01.5Z").unwrap(), 1500);
        assert_eq!(
            parse_timestamp("2024-03-01T12:00:00+01:00").unwrap(),
            1_709_290_800_000
        );
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(ArgError::Timestamp(_))
        ));
    }

    #[test]
    fn test_parse_coordinate() {
        let c = parse_coordinate("40.7, -74.0").unwrap();
        assert_eq!(c, Coordinate::new(40.7, -74.0));
        assert!(parse_coordinate("40.7").is_err());
        assert!(parse_coordinate("91,0").is_err());
        assert!(parse_coordinate("a,b").is_err());
    }

    #[test]
    fn test_settings_map_to_config() {
        let settings = Settings::try_parse_from([
            "gpx-track-inspector",
            "-g",
            "a.gpx",
            "--split-gap-secs",
            "60",
            "--lookup",
            "linear",
            "--timezone-tag",
            "CET",
            "--near",
            "1.5,2.5",
        ])
        .unwrap();

        let config = settings.config();
        assert_eq!(config.split_gap, Some(Duration::from_secs(60)));
        assert_eq!(config.lookup, LookupStrategy::Linear);
        assert_eq!(config.timezone, TimezoneInfo::new("UTC", "CET"));
        assert_eq!(config.spatial_index_min_points, 1024);
        assert_eq!(settings.near, Some(Coordinate::new(1.5, 2.5)));
        assert!(settings.at.is_none());
    }

    #[test]
    fn test_gpx_files_required() {
        assert!(Settings::try_parse_from(["gpx-track-inspector"]).is_err());
    }
}
