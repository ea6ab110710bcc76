use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::constants::{MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("expected [lon, lat] pair, got {0} value(s)")]
    ShortPair(usize),

    #[error("invalid coordinate text '{0}'")]
    Parse(String),
}

/// A WGS84 position, latitude first. Valid by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        // NaN fails both range checks
        if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Renders the provider's `"lon,lat"` query form.
    pub fn to_provider_param(&self) -> String {
        format!("{},{}", self.longitude, self.latitude)
    }

    /// Reads one provider geometry entry `[lon, lat, ...]`. Trailing values
    /// such as elevation are ignored.
    pub fn from_provider_pair(pair: &[f64]) -> Result<Self, CoordinateError> {
        match pair {
            [lon, lat, ..] => Coordinate::new(*lat, *lon),
            _ => Err(CoordinateError::ShortPair(pair.len())),
        }
    }

    pub fn from_provider_param(param: &str) -> Result<Self, CoordinateError> {
        let (lon, lat) = split_pair(param)?;
        Coordinate::new(lat, lon)
    }
}

fn split_pair(text: &str) -> Result<(f64, f64), CoordinateError> {
    let parse_err = || CoordinateError::Parse(text.to_string());
    let (first, second) = text.split_once(',').ok_or_else(parse_err)?;
    let first = first.trim().parse::<f64>().map_err(|_| parse_err())?;
    let second = second.trim().parse::<f64>().map_err(|_| parse_err())?;
    Ok((first, second))
}

/// Parses the internal `"lat,lon"` order used on the command line.
impl FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = split_pair(s)?;
        Coordinate::new(lat, lon)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}
