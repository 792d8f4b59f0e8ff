//! Stations and scheduled routes

use geo::Point;

use crate::{Minutes, SCHEDULE_SENTINEL};

/// Fixed transit stop location
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// External identifier used by routes to reference the station
    pub id: String,
    /// Station coordinates, `x` is longitude and `y` latitude
    pub geometry: Point<f64>,
}

impl Station {
    pub fn new(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            geometry: Point::new(lon, lat),
        }
    }

    pub fn lat(&self) -> f64 {
        self.geometry.y()
    }

    pub fn lon(&self) -> f64 {
        self.geometry.x()
    }
}

/// Timing of a stop event within its route
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduledTime {
    /// No time reference, only valid on a route's first stop
    Sentinel,
    /// Scheduled minute value
    At(Minutes),
}

impl ScheduledTime {
    /// Parses a schedule entry.
    ///
    /// Accepts the sentinel marker, a whole number of minutes (`"17"`) or a
    /// dash-separated list of minutes (`"12-14"`) which is averaged.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value == SCHEDULE_SENTINEL {
            return Some(Self::Sentinel);
        }

        let mut sum = 0.0;
        let mut count = 0u32;
        for part in value.split('-') {
            let minutes: u32 = part.trim().parse().ok()?;
            sum += f64::from(minutes);
            count += 1;
        }

        Some(Self::At(sum / f64::from(count)))
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Sentinel)
    }

    pub fn minutes(&self) -> Option<Minutes> {
        match self {
            Self::Sentinel => None,
            Self::At(minutes) => Some(*minutes),
        }
    }
}

/// One scheduled visit of a route at a station
#[derive(Debug, Clone, PartialEq)]
pub struct StopEvent {
    pub station_id: String,
    pub time: ScheduledTime,
}

impl StopEvent {
    pub fn new(station_id: impl Into<String>, time: ScheduledTime) -> Self {
        Self {
            station_id: station_id.into(),
            time,
        }
    }
}

/// Transit route as an ordered list of stop events
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub stops: Vec<StopEvent>,
    /// Median time between departures at a stop, in minutes
    pub median_wait: Minutes,
}

impl Route {
    pub fn new(stops: Vec<StopEvent>, median_wait: Minutes) -> Self {
        Self { stops, median_wait }
    }

    /// Expected wait for a passenger arriving at a random moment
    pub fn expected_wait(&self) -> Minutes {
        self.median_wait / 2.0
    }
}
