//! Directions provider boundary: request construction, transport and
//! response parsing.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::app_config::DirectionsConfig;
use crate::config::constants::DIRECTIONS_PATH;
use crate::data::coordinate::Coordinate;
use crate::models::route::{Path, RouteFailure, RouteRequest, RouteResult};
use crate::utils::logging::{self, DirectionsOpType, OperationCategory};

/// Computes a driving path between two coordinates. Every failure comes
/// back as a [`RouteFailure`] value.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn request_route(&self, request: RouteRequest) -> RouteResult;
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<Vec<f64>>,
}

/// Parses a GeoJSON directions body into a path. Only the first feature is
/// read. Any invalid coordinate entry rejects the whole response.
pub fn parse_route_response(body: &str) -> RouteResult {
    let _timing = logging::start_timing("parse_route_response",
        OperationCategory::Directions { subcategory: DirectionsOpType::Parse });

    let response: RouteResponse = serde_json::from_str(body)
        .map_err(|e| RouteFailure::MalformedResponse(e.to_string()))?;

    let Some(feature) = response.features.into_iter().next() else {
        return Err(RouteFailure::NoRouteFound);
    };

    let path = feature
        .geometry
        .coordinates
        .iter()
        .enumerate()
        .map(|(index, pair)| {
            Coordinate::from_provider_pair(pair)
                .map_err(|e| RouteFailure::MalformedResponse(format!("coordinate {}: {}", index, e)))
        })
        .collect::<Result<Path, RouteFailure>>()?;

    if path.is_empty() {
        return Err(RouteFailure::NoRouteFound);
    }
    Ok(path)
}

/// OpenRouteService driving-car directions over HTTPS. One attempt per
/// request, no retries.
pub struct OpenRouteServiceClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OpenRouteServiceClient {
    pub fn new(config: &DirectionsConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: directions_endpoint(&config.base_url),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch(&self, request: &RouteRequest) -> Result<String, RouteFailure> {
        let start = request.origin.to_provider_param();
        let end = request.destination.to_provider_param();
        debug!(endpoint = %self.endpoint, %start, %end, "Requesting route");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("start", start.as_str()),
                ("end", end.as_str()),
            ])
            .send()
            .await
            .map_err(describe_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RouteFailure::Network(format!("HTTP {}", status)));
        }

        response.text().await.map_err(describe_transport_error)
    }
}

#[async_trait]
impl DirectionsProvider for OpenRouteServiceClient {
    async fn request_route(&self, request: RouteRequest) -> RouteResult {
        let started = Instant::now();
        let result = match self.fetch(&request).await {
            Ok(body) => parse_route_response(&body),
            Err(failure) => Err(failure),
        };
        let elapsed: Duration = started.elapsed();
        logging::record_duration("request_route", elapsed,
            &OperationCategory::Directions { subcategory: DirectionsOpType::Request });

        match &result {
            Ok(path) => info!(points = path.len(), ?elapsed, "Route received"),
            Err(failure) => warn!(?elapsed, "Failed to get route: {}", failure),
        }
        result
    }
}

fn directions_endpoint(base_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), DIRECTIONS_PATH)
}

fn describe_transport_error(e: reqwest::Error) -> RouteFailure {
    if e.is_timeout() {
        RouteFailure::Network("request timed out".to_string())
    } else if e.is_decode() {
        RouteFailure::MalformedResponse(e.to_string())
    } else {
        RouteFailure::Network(e.to_string())
    }
}
