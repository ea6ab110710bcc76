use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::constants::{NETWORK_ERROR_MESSAGE, NO_ROUTE_FOUND_MESSAGE};
use crate::data::coordinate::Coordinate;

/// Travel-ordered route geometry from origin to destination.
pub type Path = Vec<Coordinate>;

/// Outcome of one directions request.
pub type RouteResult = Result<Path, RouteFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
}

impl RouteRequest {
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self { origin, destination }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteFailure {
    #[error("network error: {0}")]
    Network(String),

    #[error("no route found")]
    NoRouteFound,

    #[error("malformed directions response: {0}")]
    MalformedResponse(String),
}

impl RouteFailure {
    /// Text shown to the user. Malformed responses read the same as
    /// transport failures.
    pub fn user_message(&self) -> &'static str {
        match self {
            RouteFailure::NoRouteFound => NO_ROUTE_FOUND_MESSAGE,
            RouteFailure::Network(_) | RouteFailure::MalformedResponse(_) => NETWORK_ERROR_MESSAGE,
        }
    }
}
