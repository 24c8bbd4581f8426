use super::constraint::Constraint;
use super::error::LocusError;
use super::result::LocusResponse;
use super::suggest::SuggestionCandidate;

/// The external service computing reachable regions and address lookups.
///
/// Futures are not required to be `Send`: the pipeline runs on a single task.
#[allow(async_fn_in_trait)]
pub trait LocusService {
    /// Computes the region reachable under all constraints. Only address,
    /// mode, time and uncertainty of each constraint are sent.
    async fn compute_locus(&self, constraints: &[Constraint]) -> Result<LocusResponse, LocusError>;

    /// Looks up address candidates for a partial query, in service order.
    async fn geocode(&self, query: &str) -> Result<Vec<SuggestionCandidate>, LocusError>;
}
