use super::constraint::Coord;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FILL_COLOR: &str = "#3388ff";

/// Reply of the locus endpoint. Error replies may still carry the features
/// and mirrored constraints the service managed to compute.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct LocusResponse {
    #[serde(default)]
    pub features: Vec<GeometryFeature>,
    #[serde(default)]
    pub constraints: Vec<ResolvedConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl LocusResponse {
    /// Coordinates the service resolved, by request index.
    pub fn resolved_coordinates(&self) -> Vec<Option<Coord>> {
        self.constraints.iter().map(|c| c.coordinates).collect()
    }
}

/// One entry of the mirrored constraint list. Only the coordinates matter
/// here; the echoed request fields are ignored.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct ResolvedConstraint {
    #[serde(default)]
    pub coordinates: Option<Coord>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GeometryFeature {
    pub geometry: geojson::Geometry,
    #[serde(default)]
    pub properties: FeatureProperties,
}

impl GeometryFeature {
    pub fn fill_color(&self) -> &str {
        self.properties
            .color
            .as_deref()
            .unwrap_or(DEFAULT_FILL_COLOR)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct FeatureProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<u32>,
}
