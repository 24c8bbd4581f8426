use super::bounds::{compute_bounds, fit_viewport, BoundingBox, FitOptions, Viewport};
use super::constraint::{Constraint, Coord};
use super::orchestrator::LocusState;
use super::result::GeometryFeature;
use super::store::ConstraintList;
use serde::Serialize;

/// A pin for one resolved constraint, with its popup text.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Marker {
    /// Position of the constraint in the list; removal goes by this index.
    pub index: usize,
    pub position: Coord,
    pub title: String,
    pub address: String,
    pub mode: String,
    pub time: String,
}

impl Marker {
    fn for_constraint(index: usize, constraint: &Constraint) -> Option<Self> {
        let position = constraint.coordinates?;
        Some(Self {
            index,
            position,
            title: format!("Constraint {}", index + 1),
            address: constraint.address.clone(),
            mode: constraint.mode.display_name().to_string(),
            time: constraint.time_label(),
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Region {
    pub fill_color: String,
    pub geometry: geojson::Geometry,
}

impl From<&GeometryFeature> for Region {
    fn from(feature: &GeometryFeature) -> Self {
        Self {
            fill_color: feature.fill_color().to_string(),
            geometry: feature.geometry.clone(),
        }
    }
}

/// Everything the map and the banner need for one frame.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MapView {
    pub version: u64,
    pub constraints: Vec<Constraint>,
    pub markers: Vec<Marker>,
    pub regions: Vec<Region>,
    pub loading: bool,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub error_details: Vec<String>,
    pub bounds: Option<BoundingBox>,
    /// Present when bounds exist; otherwise the viewport stays where it is.
    pub viewport: Option<Viewport>,
}

impl MapView {
    pub fn derive(list: &ConstraintList, state: &LocusState, size: (f64, f64), fit: &FitOptions) -> Self {
        let features = state.features.as_deref();
        let bounds = compute_bounds(list.items(), features);
        Self {
            version: list.version(),
            constraints: list.items().to_vec(),
            markers: list
                .items()
                .iter()
                .enumerate()
                .filter_map(|(i, c)| Marker::for_constraint(i, c))
                .collect(),
            regions: features
                .unwrap_or_default()
                .iter()
                .map(Region::from)
                .collect(),
            loading: state.is_loading(),
            error: state.error.clone(),
            error_details: state.error_details.clone(),
            bounds,
            viewport: bounds.map(|b| fit_viewport(&b, size, fit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::locus::constraint::TravelMode;
    use crate::sdk::locus::store::ConstraintStore;
    use crate::sdk::locus::testing::square;

    #[test]
    fn test_markers_only_for_resolved_constraints() {
        let store = ConstraintStore::new();
        store.append(Constraint::new("Rennes", TravelMode::Cycling, 30, 5));
        store.append(Constraint::new("Atlantis", TravelMode::Driving, 10, 2));
        store.reconcile(store.version(), &[Some((-1.68, 48.11)), None]);

        let view = MapView::derive(
            &store.snapshot(),
            &LocusState::default(),
            (800.0, 600.0),
            &FitOptions::default(),
        );
        assert_eq!(view.markers.len(), 1);
        let marker = &view.markers[0];
        assert_eq!(marker.title, "Constraint 1");
        assert_eq!(marker.mode, "Bicycle");
        assert_eq!(marker.time, "30 ± 5 min");
        assert!(view.regions.is_empty());
        assert_eq!(view.viewport.map(|v| v.zoom), Some(15));
    }

    #[test]
    fn test_empty_view_leaves_viewport_alone() {
        let view = MapView::derive(
            &ConstraintStore::new().snapshot(),
            &LocusState::default(),
            (800.0, 600.0),
            &FitOptions::default(),
        );
        assert_eq!(view.bounds, None);
        assert_eq!(view.viewport, None);
        assert!(!view.loading);
    }

    #[test]
    fn test_regions_keep_their_colors() {
        let state = LocusState {
            features: Some(vec![GeometryFeature {
                geometry: square((2.0, 2.0), 1.0),
                properties: Default::default(),
            }]),
            ..LocusState::default()
        };
        let view = MapView::derive(
            &ConstraintStore::new().snapshot(),
            &state,
            (800.0, 600.0),
            &FitOptions::default(),
        );
        assert_eq!(view.regions[0].fill_color, "#3388ff");
        assert_eq!(
            view.bounds,
            Some(BoundingBox {
                west: 1.0,
                south: 1.0,
                east: 3.0,
                north: 3.0
            })
        );
    }
}
