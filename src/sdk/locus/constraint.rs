use super::error::LocusError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// (longitude, latitude), in the order the service emits them.
pub type Coord = (f64, f64);

pub const TIME_RANGE: (u32, u32) = (1, 120);
pub const UNCERTAINTY_RANGE: (u32, u32) = (0, 30);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TravelMode {
    #[default]
    #[serde(rename = "driving-car")]
    Driving,
    #[serde(rename = "foot-walking")]
    Walking,
    #[serde(rename = "cycling")]
    Cycling,
}

impl TravelMode {
    /// Routing profile name understood by the locus service.
    pub fn profile(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving-car",
            TravelMode::Walking => "foot-walking",
            TravelMode::Cycling => "cycling",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TravelMode::Driving => "Car",
            TravelMode::Walking => "Walking",
            TravelMode::Cycling => "Bicycle",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for TravelMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driving-car" | "driving" | "car" => Ok(TravelMode::Driving),
            "foot-walking" | "walking" | "foot" => Ok(TravelMode::Walking),
            "cycling" | "bicycle" | "bike" => Ok(TravelMode::Cycling),
            other => Err(format!("Unknown travel mode: {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Constraint {
    pub address: String,
    pub mode: TravelMode,
    pub time: u32,
    pub uncertainty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coord>,
}

impl Constraint {
    pub fn new(address: &str, mode: TravelMode, time: u32, uncertainty: u32) -> Self {
        Self {
            address: address.to_string(),
            mode,
            time: time.clamp(TIME_RANGE.0, TIME_RANGE.1),
            uncertainty: uncertainty.clamp(UNCERTAINTY_RANGE.0, UNCERTAINTY_RANGE.1),
            coordinates: None,
        }
    }

    /// "10 ± 2 min"
    pub fn time_label(&self) -> String {
        format!("{} ± {} min", self.time, self.uncertainty)
    }
}

/// Form input for a constraint that has not been added yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDraft {
    pub address: String,
    pub mode: TravelMode,
    pub time: String,
    pub uncertainty: String,
}

impl Default for ConstraintDraft {
    fn default() -> Self {
        Self {
            address: String::new(),
            mode: TravelMode::Driving,
            time: "10".to_string(),
            uncertainty: "2".to_string(),
        }
    }
}

impl ConstraintDraft {
    /// Coerces the form fields into a constraint. Numbers are clamped into
    /// their ranges; an empty address is rejected.
    pub fn build(&self) -> Result<Constraint, LocusError> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(LocusError::EmptyAddress);
        }
        let time = parse_minutes("time", &self.time)?;
        let uncertainty = parse_minutes("uncertainty", &self.uncertainty)?;
        Ok(Constraint {
            address: address.to_string(),
            mode: self.mode,
            time: clamp_minutes(time, TIME_RANGE),
            uncertainty: clamp_minutes(uncertainty, UNCERTAINTY_RANGE),
            coordinates: None,
        })
    }

    /// Builds the constraint and resets the form to its defaults.
    /// On error the draft is left untouched.
    pub fn take(&mut self) -> Result<Constraint, LocusError> {
        let constraint = self.build()?;
        *self = ConstraintDraft::default();
        Ok(constraint)
    }
}

/// Parses the command-line form `ADDRESS;MODE;TIME;UNCERTAINTY`. Trailing
/// fields may be omitted and keep their defaults.
impl FromStr for ConstraintDraft {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(';');
        let mut draft = ConstraintDraft {
            address: parts.next().unwrap_or_default().trim().to_string(),
            ..ConstraintDraft::default()
        };
        if let Some(mode) = parts.next() {
            draft.mode = mode.parse()?;
        }
        if let Some(time) = parts.next() {
            draft.time = time.trim().to_string();
        }
        if let Some(uncertainty) = parts.next() {
            draft.uncertainty = uncertainty.trim().to_string();
        }
        if parts.next().is_some() {
            return Err(format!("Too many fields in constraint: {}", s));
        }
        Ok(draft)
    }
}

fn parse_minutes(field: &'static str, value: &str) -> Result<i64, LocusError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| LocusError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

fn clamp_minutes(value: i64, (lo, hi): (u32, u32)) -> u32 {
    value.clamp(lo as i64, hi as i64) as u32
}
