use std::{fs, path::Path};

use anyhow::Result;
use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::aero::{
    atmosphere::{AtmosphericReading, InvalidReading},
    wind::{InvalidWind, WindVector},
};

/// Mean earth radius
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LegError {
    #[error("Distance must be non-negative and finite, got {0} km")]
    Distance(f64),

    #[error("Waypoint '{0}' has no position")]
    MissingPosition(String),

    #[error("Both a wind bearing and a wind factor were given")]
    AmbiguousWind,

    #[error("Invalid atmospheric reading")]
    Reading(#[from] InvalidReading),

    #[error("Invalid wind")]
    Wind(#[from] InvalidWind),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    #[error("A route needs at least two waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("Error in leg {index}")]
    Leg {
        index: usize,
        #[source]
        source: LegError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub ident: String,
    /// Latitude and longitude, in degrees
    #[serde(default)]
    pub position: Option<(f64, f64)>,
}

impl Waypoint {
    pub fn new(ident: &str) -> Self {
        Waypoint {
            ident: ident.to_string(),
            position: None,
        }
    }

    pub fn at(ident: &str, lat_deg: f64, lon_deg: f64) -> Self {
        Waypoint {
            ident: ident.to_string(),
            position: Some((lat_deg, lon_deg)),
        }
    }
}

/// Great-circle distance between two points (haversine).
pub fn great_circle_distance_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let a = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lon2 - lon1) / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteLeg {
    pub from: Waypoint,
    pub to: Waypoint,
    pub distance_km: f64,
    pub reading: AtmosphericReading,
    pub wind: WindVector,
}

impl RouteLeg {
    pub fn new(
        from: Waypoint,
        to: Waypoint,
        distance_km: f64,
        reading: AtmosphericReading,
        wind: WindVector,
    ) -> Result<Self, LegError> {
        let leg = RouteLeg {
            from,
            to,
            distance_km,
            reading,
            wind,
        };
        leg.validate()?;

        Ok(leg)
    }

    pub fn great_circle(
        from: Waypoint,
        to: Waypoint,
        reading: AtmosphericReading,
        wind: WindVector,
    ) -> Result<Self, LegError> {
        let start = from
            .position
            .ok_or_else(|| LegError::MissingPosition(from.ident.clone()))?;
        let end = to
            .position
            .ok_or_else(|| LegError::MissingPosition(to.ident.clone()))?;

        Self::new(from, to, great_circle_distance_km(start, end), reading, wind)
    }

    pub fn validate(&self) -> Result<(), LegError> {
        if !(self.distance_km.is_finite() && self.distance_km >= 0.0) {
            return Err(LegError::Distance(self.distance_km));
        }
        self.reading.validate()?;
        self.wind.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub name: String,
    pub legs: Vec<RouteLeg>,
}

impl Route {
    pub fn new(name: &str, legs: Vec<RouteLeg>) -> Self {
        Route {
            name: name.to_string(),
            legs,
        }
    }

    /// Chains great-circle legs through the waypoints, all flown in the same
    /// conditions.
    pub fn direct(
        name: &str,
        waypoints: &[Waypoint],
        reading: AtmosphericReading,
        wind: WindVector,
    ) -> Result<Self, Error> {
        if waypoints.len() < 2 {
            return Err(Error::TooFewWaypoints(waypoints.len()));
        }

        let legs = waypoints
            .iter()
            .tuple_windows()
            .enumerate()
            .map(|(index, (from, to))| {
                RouteLeg::great_circle(from.clone(), to.clone(), reading, wind)
                    .map_err(|source| Error::Leg { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(name, legs))
    }

    pub fn total_distance_km(&self) -> f64 {
        self.legs.iter().map(|leg| leg.distance_km).sum()
    }
}

/// Leg as written in a route file. The distance is optional when both
/// waypoints carry a position.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct LegEntry {
    from: Waypoint,
    to: Waypoint,
    distance_km: Option<f64>,
    altitude_m: Option<f64>,
    temperature_c: f64,
    pressure_hpa: f64,
    #[serde(default)]
    visibility_m: Option<f64>,
    #[serde(default)]
    wind_speed_kmh: f64,
    wind_bearing_deg: Option<f64>,
    wind_factor: Option<f64>,
}

impl LegEntry {
    fn into_leg(self) -> Result<RouteLeg, LegError> {
        let mut reading = AtmosphericReading::new(self.temperature_c, self.pressure_hpa, self.altitude_m)?;
        if let Some(visibility_m) = self.visibility_m {
            reading = reading.with_visibility(visibility_m)?;
        }

        let wind = match (self.wind_bearing_deg, self.wind_factor) {
            (Some(_), Some(_)) => return Err(LegError::AmbiguousWind),
            (Some(bearing), None) => WindVector::from_bearing(self.wind_speed_kmh, bearing)?,
            (None, Some(factor)) => WindVector::from_factor(self.wind_speed_kmh, factor)?,
            (None, None) => WindVector::from_factor(self.wind_speed_kmh, 1.0)?,
        };

        match self.distance_km {
            Some(distance_km) => RouteLeg::new(self.from, self.to, distance_km, reading, wind),
            None => RouteLeg::great_circle(self.from, self.to, reading, wind),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteFile {
    name: String,
    #[serde(default)]
    legs: Vec<LegEntry>,
}

impl RouteFile {
    fn into_route(self) -> Result<Route, Error> {
        let legs = self
            .legs
            .into_iter()
            .enumerate()
            .map(|(index, entry)| entry.into_leg().map_err(|source| Error::Leg { index, source }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Route::new(&self.name, legs))
    }
}

pub fn parse_route(toml_str: &str) -> Result<Route> {
    let file: RouteFile = toml::from_str(toml_str)?;

    Ok(file.into_route()?)
}

pub fn load_route(path: &Path) -> Result<Route> {
    info!("Reading route from '{}'", path.display());

    let route_toml = fs::read_to_string(path)?;
    parse_route(&route_toml)
}
