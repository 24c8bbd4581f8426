use crate::sdk::locus::constraint::{Constraint, TravelMode};
use crate::sdk::locus::error::ErrorPayload;
use crate::sdk::locus::suggest::SuggestionCandidate;
use serde::{Deserialize, Serialize};

// --- Data Structures for the locus service wire format ---

#[derive(Serialize, Debug)]
pub struct LocusRequest<'a> {
    pub constraints: Vec<RequestConstraint<'a>>,
}

/// A constraint as sent to the service; coordinates are never sent.
#[derive(Serialize, Debug)]
pub struct RequestConstraint<'a> {
    pub address: &'a str,
    pub mode: TravelMode,
    pub time: u32,
    pub uncertainty: u32,
}

impl<'a> LocusRequest<'a> {
    pub fn new(constraints: &'a [Constraint]) -> Self {
        Self {
            constraints: constraints
                .iter()
                .map(|c| RequestConstraint {
                    address: &c.address,
                    mode: c.mode,
                    time: c.time,
                    uncertainty: c.uncertainty,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum GeocodeReply {
    Candidates(Vec<SuggestionCandidate>),
    Error(ErrorPayload),
}
