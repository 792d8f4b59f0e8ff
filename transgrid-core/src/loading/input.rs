//! Station and route documents produced by the schedule scrapers

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;
use serde::Deserialize;

use super::de::deserialize_code;
use crate::model::{Route, ScheduledTime, Station, StopEvent};
use crate::{Error, InputError};

/// Station entry, `{"c": code, "x": lon, "y": lat}`
#[derive(Debug, Clone, Deserialize)]
pub struct StationRecord {
    #[serde(rename = "c", alias = "id", deserialize_with = "deserialize_code")]
    pub id: String,
    #[serde(rename = "x", alias = "lon")]
    pub lon: f64,
    #[serde(rename = "y", alias = "lat")]
    pub lat: f64,
}

/// Stop entry, `[time, station code]`
#[derive(Debug, Clone, Deserialize)]
pub struct StopRecord(
    #[serde(deserialize_with = "deserialize_code")] pub String,
    #[serde(deserialize_with = "deserialize_code")] pub String,
);

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRecord {
    pub stops: Vec<StopRecord>,
    pub median_wait: f64,
}

impl From<StationRecord> for Station {
    fn from(record: StationRecord) -> Self {
        Station::new(record.id, record.lat, record.lon)
    }
}

impl RouteRecord {
    /// Converts the record, parsing every schedule entry
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnparsableTime`] naming the first bad entry
    pub fn into_route(self, route_idx: usize) -> Result<Route, InputError> {
        let stops = self
            .stops
            .into_iter()
            .enumerate()
            .map(|(stop_idx, StopRecord(time, station))| {
                ScheduledTime::parse(&time)
                    .map(|time| StopEvent::new(station, time))
                    .ok_or(InputError::UnparsableTime {
                        route: route_idx,
                        stop: stop_idx,
                        value: time,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Route::new(stops, self.median_wait))
    }
}

/// Parses a station list document
///
/// # Errors
///
/// Returns [`Error::JsonError`] if the document is not a station list
pub fn parse_stations(json: &str) -> Result<Vec<Station>, Error> {
    let records: Vec<StationRecord> = serde_json::from_str(json)?;
    Ok(records.into_iter().map(Station::from).collect())
}

/// Parses a route list document
///
/// # Errors
///
/// Returns [`Error::JsonError`] for invalid documents and
/// [`Error::MalformedInputData`] for unparsable schedule entries
pub fn parse_routes(json: &str) -> Result<Vec<Route>, Error> {
    let records: Vec<RouteRecord> = serde_json::from_str(json)?;
    convert_routes(records)
}

/// Reads the station list from a JSON file
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed
pub fn load_stations(path: &Path) -> Result<Vec<Station>, Error> {
    let records: Vec<StationRecord> = serde_json::from_reader(open(path)?)?;
    info!("Loaded {} stations from {}", records.len(), path.display());
    Ok(records.into_iter().map(Station::from).collect())
}

/// Reads the route list from a JSON file
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a schedule entry
/// is malformed
pub fn load_routes(path: &Path) -> Result<Vec<Route>, Error> {
    let records: Vec<RouteRecord> = serde_json::from_reader(open(path)?)?;
    info!("Loaded {} routes from {}", records.len(), path.display());
    convert_routes(records)
}

fn convert_routes(records: Vec<RouteRecord>) -> Result<Vec<Route>, Error> {
    records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| record.into_route(idx).map_err(Error::from))
        .collect()
}

fn open(path: &Path) -> Result<BufReader<File>, Error> {
    let file = File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        )
    })?;
    Ok(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_scraper_station_format() {
        let stations =
            parse_stations(r#"[{"c": "0012", "x": 23.3, "y": 42.7}, {"c": 15, "x": 23.4, "y": 42.65}]"#)
                .unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].id, "0012");
        assert_eq!(stations[1].id, "15");
        assert!((stations[0].lon() - 23.3).abs() < f64::EPSILON);
        assert!((stations[1].lat() - 42.65).abs() < f64::EPSILON);
    }

    #[test]
    fn accepts_long_station_keys() {
        let stations = parse_stations(r#"[{"id": "x1", "lon": 1.0, "lat": 2.0}]"#).unwrap();
        assert_eq!(stations[0], Station::new("x1", 2.0, 1.0));
    }

    #[test]
    fn reads_route_stops() {
        let routes = parse_routes(
            r#"[{"stops": [["***", "0012"], ["3-5", 15], [9, "0012"]], "median_wait": 12.5}]"#,
        )
        .unwrap();
        assert_eq!(routes.len(), 1);
        let route = &routes[0];
        assert!((route.median_wait - 12.5).abs() < f64::EPSILON);
        assert_eq!(route.stops[0].time, ScheduledTime::Sentinel);
        assert_eq!(route.stops[1], StopEvent::new("15", ScheduledTime::At(4.0)));
        assert_eq!(route.stops[2].time, ScheduledTime::At(9.0));
    }

    #[test]
    fn bad_schedule_entry_names_its_position() {
        let err = parse_routes(
            r#"[{"stops": [], "median_wait": 1}, {"stops": [["1", "a"], ["soon", "b"]], "median_wait": 1}]"#,
        )
        .unwrap_err();
        match err {
            Error::MalformedInputData(InputError::UnparsableTime { route, stop, value }) => {
                assert_eq!((route, stop), (1, 1));
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_mentions_path() {
        let err = load_stations(Path::new("/nonexistent/stops.json")).unwrap_err();
        assert!(matches!(err, Error::IoError(_)));
        assert!(err.to_string().contains("/nonexistent/stops.json"));
    }
}
