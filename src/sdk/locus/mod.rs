pub mod bounds;
pub mod constraint;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod result;
pub mod service;
pub mod store;
pub mod suggest;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use bounds::{compute_bounds, fit_viewport, BoundingBox, FitOptions, Viewport};
pub use constraint::{Constraint, ConstraintDraft, Coord, TravelMode};
pub use error::LocusError;
pub use orchestrator::{LocusState, Phase, ResultOrchestrator};
pub use provider::RemoteLocusService;
pub use result::{GeometryFeature, LocusResponse};
pub use service::LocusService;
pub use store::{ConstraintList, ConstraintStore, ReconcileOutcome};
pub use suggest::{suggest_once, FieldEvent, SuggestionCandidate, SuggestionFetcher, SuggestionView};
pub use view::MapView;
