pub mod sdk;

pub use sdk::config::ServiceConfig;
pub use sdk::locus::{
    ConstraintDraft, ConstraintStore, LocusError, LocusService, MapView, RemoteLocusService,
    ResultOrchestrator, SuggestionFetcher,
};
