//! In-memory stand-in for the locus service.

use super::constraint::{Constraint, Coord};
use super::error::LocusError;
use super::result::{FeatureProperties, GeometryFeature, LocusResponse, ResolvedConstraint};
use super::service::LocusService;
use super::suggest::SuggestionCandidate;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{self, Instant};

pub fn candidate(name: &str) -> SuggestionCandidate {
    SuggestionCandidate {
        display_name: name.to_string(),
        raw: serde_json::Map::new(),
    }
}

/// A closed square around `center`, as a GeoJSON polygon.
pub fn square(center: Coord, half_side: f64) -> geojson::Geometry {
    let (x, y) = center;
    geojson::Geometry::new(geojson::Value::Polygon(vec![vec![
        vec![x - half_side, y - half_side],
        vec![x + half_side, y - half_side],
        vec![x + half_side, y + half_side],
        vec![x - half_side, y + half_side],
        vec![x - half_side, y - half_side],
    ]]))
}

enum LocusFailure {
    Service(String),
    Transport,
}

#[derive(Default)]
pub struct FakeLocusService {
    coordinates: HashMap<String, Coord>,
    candidate_count: usize,
    fail_lookups: bool,
    failure: Option<LocusFailure>,
    latency: Option<fn(&[Constraint]) -> Duration>,
    requests: RefCell<Vec<(Instant, Vec<Constraint>)>>,
    lookups: RefCell<Vec<(Instant, String)>>,
}

impl FakeLocusService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: &str, coord: Coord) -> Self {
        self.coordinates.insert(address.to_string(), coord);
        self
    }

    pub fn with_candidates(mut self, count: usize) -> Self {
        self.candidate_count = count;
        self
    }

    pub fn with_latency(mut self, latency: fn(&[Constraint]) -> Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    /// Replies with an error payload instead of features.
    pub fn with_service_error(mut self, message: &str) -> Self {
        self.failure = Some(LocusFailure::Service(message.to_string()));
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.failure = Some(LocusFailure::Transport);
        self
    }

    pub fn requests(&self) -> Vec<(Instant, Vec<Constraint>)> {
        self.requests.borrow().clone()
    }

    pub fn lookups(&self) -> Vec<(Instant, String)> {
        self.lookups.borrow().clone()
    }
}

impl LocusService for FakeLocusService {
    async fn compute_locus(&self, constraints: &[Constraint]) -> Result<LocusResponse, LocusError> {
        self.requests
            .borrow_mut()
            .push((Instant::now(), constraints.to_vec()));
        if let Some(latency) = self.latency {
            time::sleep(latency(constraints)).await;
        }

        let mirrored: Vec<ResolvedConstraint> = constraints
            .iter()
            .map(|c| ResolvedConstraint {
                coordinates: self.coordinates.get(&c.address).copied(),
            })
            .collect();

        match &self.failure {
            Some(LocusFailure::Transport) => Err(LocusError::RawApiError(
                "connection refused".to_string(),
            )),
            // error replies only describe the addresses that resolved
            Some(LocusFailure::Service(message)) => Ok(LocusResponse {
                error: Some(message.clone()),
                constraints: mirrored
                    .into_iter()
                    .filter(|c| c.coordinates.is_some())
                    .collect(),
                ..LocusResponse::default()
            }),
            None => {
                let features = constraints
                    .iter()
                    .filter_map(|c| self.coordinates.get(&c.address))
                    .map(|coord| GeometryFeature {
                        geometry: square(*coord, 0.1),
                        properties: FeatureProperties {
                            color: Some(format!("#{:06x}", constraints.len())),
                            ..FeatureProperties::default()
                        },
                    })
                    .collect();
                Ok(LocusResponse {
                    features,
                    constraints: mirrored,
                    ..LocusResponse::default()
                })
            }
        }
    }

    async fn geocode(&self, query: &str) -> Result<Vec<SuggestionCandidate>, LocusError> {
        self.lookups
            .borrow_mut()
            .push((Instant::now(), query.to_string()));
        if self.fail_lookups {
            return Err(LocusError::Service {
                message: "Failed to fetch suggestions".to_string(),
                details: Vec::new(),
            });
        }
        Ok((0..self.candidate_count)
            .map(|i| candidate(&format!("{} {}", query, i)))
            .collect())
    }
}
