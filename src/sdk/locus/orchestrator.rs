use super::constraint::Constraint;
use super::error::LocusError;
use super::result::{GeometryFeature, LocusResponse};
use super::service::LocusService;
use super::store::{ConstraintList, ConstraintStore, ReconcileOutcome};
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Waiting for the reply to the request built from `version`.
    Fetching { version: u64 },
}

/// A recomputation request, tagged with the list version it was built from.
#[derive(Debug, Clone)]
pub struct RecomputeTicket {
    version: u64,
    constraints: Arc<Vec<Constraint>>,
}

impl RecomputeTicket {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

/// What the display layer shows besides the constraint list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocusState {
    pub phase: Phase,
    pub features: Option<Vec<GeometryFeature>>,
    pub error: Option<String>,
    pub error_details: Vec<String>,
}

impl LocusState {
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Fetching { .. })
    }

    /// Reacts to a new constraint list. Returns the request to issue, or
    /// `None` when the list is empty and the result was simply cleared.
    pub fn request_started(&mut self, list: &ConstraintList) -> Option<RecomputeTicket> {
        if list.is_empty() {
            self.features = None;
            self.phase = Phase::Idle;
            return None;
        }
        self.error = None;
        self.error_details.clear();
        self.phase = Phase::Fetching {
            version: list.version(),
        };
        Some(RecomputeTicket {
            version: list.version(),
            constraints: list.shared_items(),
        })
    }

    /// Installs a reply. Returns false, leaving the state untouched, when the
    /// ticket no longer matches `current_version`.
    pub fn request_succeeded(
        &mut self,
        ticket: &RecomputeTicket,
        response: &LocusResponse,
        current_version: u64,
    ) -> bool {
        if ticket.version != current_version {
            return false;
        }
        match &response.error {
            Some(message) => {
                self.error = Some(message.clone());
                self.error_details = response.details.clone();
                self.features = None;
            }
            None => {
                self.features = Some(response.features.clone());
                self.error = None;
                self.error_details.clear();
            }
        }
        self.phase = Phase::Idle;
        true
    }

    pub fn request_failed(
        &mut self,
        ticket: &RecomputeTicket,
        error: &LocusError,
        current_version: u64,
    ) -> bool {
        if ticket.version != current_version {
            return false;
        }
        self.features = None;
        self.error = Some(error.user_message());
        self.error_details = error.details().to_vec();
        self.phase = Phase::Idle;
        true
    }
}

type Completion = (RecomputeTicket, Result<LocusResponse, LocusError>);

/// Keeps the displayed result in step with the constraint store: recomputes
/// on every list change and writes resolved coordinates back.
pub struct ResultOrchestrator<S> {
    service: S,
    store: ConstraintStore,
    state: watch::Sender<LocusState>,
}

impl<S: LocusService> ResultOrchestrator<S> {
    pub fn new(service: S, store: ConstraintStore) -> Self {
        let (state, _rx) = watch::channel(LocusState::default());
        Self {
            service,
            store,
            state,
        }
    }

    pub fn store(&self) -> &ConstraintStore {
        &self.store
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn state(&self) -> LocusState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LocusState> {
        self.state.subscribe()
    }

    /// Runs forever, reacting to every change of the store.
    pub async fn run(&self) {
        self.drive(false).await
    }

    /// Runs until no list change is pending and no request is in flight.
    pub async fn run_until_settled(&self) {
        self.drive(true).await
    }

    async fn drive(&self, settle: bool) {
        let mut changes = self.store.subscribe();
        let mut in_flight: FuturesUnordered<LocalBoxFuture<'_, Completion>> = FuturesUnordered::new();
        let mut pending = Some(changes.borrow_and_update().clone());

        loop {
            if pending.is_none() && changes.has_changed().unwrap_or(false) {
                pending = Some(changes.borrow_and_update().clone());
            }
            if let Some(list) = pending.take() {
                if let Some(ticket) = self.begin(&list) {
                    let service = &self.service;
                    in_flight.push(
                        async move {
                            let outcome = service.compute_locus(ticket.constraints()).await;
                            (ticket, outcome)
                        }
                        .boxed_local(),
                    );
                }
            }
            if settle && in_flight.is_empty() {
                break;
            }

            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    pending = Some(changes.borrow_and_update().clone());
                }
                Some((ticket, outcome)) = in_flight.next(), if !in_flight.is_empty() => {
                    self.complete(ticket, outcome);
                }
            }
        }
    }

    fn begin(&self, list: &ConstraintList) -> Option<RecomputeTicket> {
        let mut ticket = None;
        self.state.send_modify(|state| ticket = state.request_started(list));
        match &ticket {
            Some(t) => log::debug!(
                "[ORCHESTRATOR] recomputing {} constraint(s) for version {}",
                t.constraints().len(),
                t.version()
            ),
            None => log::debug!(
                "[ORCHESTRATOR] constraint list empty at version {}, result cleared",
                list.version()
            ),
        }
        ticket
    }

    fn complete(&self, ticket: RecomputeTicket, outcome: Result<LocusResponse, LocusError>) {
        let current = self.store.version();
        match outcome {
            Ok(response) => {
                let applied = self
                    .state
                    .send_if_modified(|state| state.request_succeeded(&ticket, &response, current));
                if !applied {
                    log::debug!(
                        "[ORCHESTRATOR] discarding stale reply for version {} (now {})",
                        ticket.version(),
                        current
                    );
                    return;
                }
                let resolved = response.resolved_coordinates();
                if let Some(message) = &response.error {
                    log::warn!("Locus service reported an error: {}", message);
                    // Error replies may list only the addresses that resolved;
                    // positions are then meaningless.
                    if resolved.len() != ticket.constraints().len() {
                        log::warn!(
                            "Error reply describes {} of {} constraint(s), coordinates not written back",
                            resolved.len(),
                            ticket.constraints().len()
                        );
                        return;
                    }
                }
                match self.store.reconcile(ticket.version(), &resolved) {
                    ReconcileOutcome::Updated { version } => log::debug!(
                        "[ORCHESTRATOR] resolved coordinates installed as version {}",
                        version
                    ),
                    ReconcileOutcome::Unchanged => {
                        log::debug!("[ORCHESTRATOR] coordinates converged")
                    }
                    ReconcileOutcome::Stale => {}
                }
            }
            Err(e) => {
                let applied = self
                    .state
                    .send_if_modified(|state| state.request_failed(&ticket, &e, current));
                if applied {
                    log::error!("Failed to fetch results: {}", e);
                } else {
                    log::debug!(
                        "[ORCHESTRATOR] discarding stale failure for version {}: {}",
                        ticket.version(),
                        e
                    );
                }
            }
        }
    }
}
