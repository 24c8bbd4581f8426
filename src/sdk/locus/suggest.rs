//! Address autocomplete: debounced lookups with a capped candidate list.
//!
//! [`SuggestionFetcher`] is a plain state machine driven by explicit instants;
//! [`SuggestionFetcher::run`] drives it from a stream of [`FieldEvent`]s on the
//! tokio clock.

use super::error::LocusError;
use super::service::LocusService;
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};

pub const QUIET_PERIOD: Duration = Duration::from_millis(400);
pub const BLUR_GRACE: Duration = Duration::from_millis(200);
pub const MIN_QUERY_CHARS: usize = 3;
pub const MAX_CANDIDATES: usize = 5;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SuggestionCandidate {
    pub display_name: String,
    /// Remaining fields of the geocoder reply, passed through untouched.
    #[serde(flatten)]
    pub raw: serde_json::Map<String, serde_json::Value>,
}

/// Restartable quiet-period timer. Only the latest value survives.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
    pending: Option<String>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
            pending: None,
        }
    }

    pub fn reset(&mut self, value: String, now: Instant) {
        self.pending = Some(value);
        self.deadline = Some(now + self.quiet);
    }

    pub fn cancel(&mut self) {
        self.pending = None;
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Hands out the pending value once the quiet period has elapsed.
    pub fn fire(&mut self, now: Instant) -> Option<String> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }
}

/// User interaction with the address field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEvent {
    Input(String),
    Focus,
    Blur,
    Select(usize),
}

/// What the address field displays.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct SuggestionView {
    pub text: String,
    pub candidates: Vec<SuggestionCandidate>,
}

/// A lookup that was issued; its reply only counts while the generation
/// still matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    generation: u64,
    pub query: String,
}

#[derive(Debug, Clone)]
pub struct SuggestionFetcher {
    debounce: Debouncer,
    blur_grace: Duration,
    blur_deadline: Option<Instant>,
    generation: u64,
    view: SuggestionView,
}

impl Default for SuggestionFetcher {
    fn default() -> Self {
        Self::new(QUIET_PERIOD, BLUR_GRACE)
    }
}

impl SuggestionFetcher {
    pub fn new(quiet: Duration, blur_grace: Duration) -> Self {
        Self {
            debounce: Debouncer::new(quiet),
            blur_grace,
            blur_deadline: None,
            generation: 0,
            view: SuggestionView::default(),
        }
    }

    pub fn view(&self) -> &SuggestionView {
        &self.view
    }

    pub fn text(&self) -> &str {
        &self.view.text
    }

    pub fn candidates(&self) -> &[SuggestionCandidate] {
        &self.view.candidates
    }

    pub fn on_input(&mut self, text: &str, now: Instant) {
        self.view.text = text.to_string();
        self.generation += 1;
        self.blur_deadline = None;
        self.debounce.reset(text.to_string(), now);
    }

    pub fn on_focus(&mut self, now: Instant) {
        self.blur_deadline = None;
        if self.view.text.chars().count() >= MIN_QUERY_CHARS {
            self.debounce.reset(self.view.text.clone(), now);
        }
    }

    /// Candidates stay clickable for the grace period before being cleared.
    pub fn on_blur(&mut self, now: Instant) {
        self.blur_deadline = Some(now + self.blur_grace);
    }

    /// Takes the candidate at `index` into the field and clears the list.
    pub fn select(&mut self, index: usize) -> Option<SuggestionCandidate> {
        let candidate = self.view.candidates.get(index).cloned()?;
        self.view.text = candidate.display_name.clone();
        self.clear();
        Some(candidate)
    }

    pub fn handle(&mut self, event: FieldEvent, now: Instant) {
        match event {
            FieldEvent::Input(text) => self.on_input(&text, now),
            FieldEvent::Focus => self.on_focus(now),
            FieldEvent::Blur => self.on_blur(now),
            FieldEvent::Select(index) => {
                if self.select(index).is_none() {
                    log::debug!("[SUGGEST] ignoring selection of missing candidate {}", index);
                }
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.debounce.deadline(), self.blur_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Applies elapsed timers. Returns a lookup to issue when the quiet
    /// period ended on a long enough query.
    pub fn poll(&mut self, now: Instant) -> Option<LookupTicket> {
        if self.blur_deadline.is_some_and(|deadline| deadline <= now) {
            self.clear();
            return None;
        }
        let query = self.debounce.fire(now)?;
        if query.chars().count() < MIN_QUERY_CHARS {
            self.view.candidates.clear();
            return None;
        }
        Some(LookupTicket {
            generation: self.generation,
            query,
        })
    }

    /// Installs the reply of a lookup. Returns false when the reply is for
    /// text the field no longer shows.
    pub fn finish_lookup(
        &mut self,
        ticket: &LookupTicket,
        result: Result<Vec<SuggestionCandidate>, LocusError>,
    ) -> bool {
        if ticket.generation != self.generation {
            log::debug!("[SUGGEST] discarding reply for outdated query \"{}\"", ticket.query);
            return false;
        }
        self.view.candidates = capped(result, &ticket.query);
        true
    }

    fn clear(&mut self) {
        self.view.candidates.clear();
        self.blur_deadline = None;
        self.debounce.cancel();
        self.generation += 1;
    }

    /// Drives the fetcher until the event channel closes, publishing every
    /// change of the field to `view`.
    pub async fn run<S: LocusService>(
        mut self,
        service: &S,
        mut events: mpsc::UnboundedReceiver<FieldEvent>,
        view: watch::Sender<SuggestionView>,
    ) {
        type Lookup<'a> =
            LocalBoxFuture<'a, (LookupTicket, Result<Vec<SuggestionCandidate>, LocusError>)>;
        let mut lookups: FuturesUnordered<Lookup<'_>> = FuturesUnordered::new();

        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(event, Instant::now()),
                    None => break,
                },
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(ticket) = self.poll(Instant::now()) {
                        log::debug!("[SUGGEST] looking up \"{}\"", ticket.query);
                        lookups.push(
                            async move {
                                let result = service.geocode(&ticket.query).await;
                                (ticket, result)
                            }
                            .boxed_local(),
                        );
                    }
                }
                Some((ticket, result)) = lookups.next(), if !lookups.is_empty() => {
                    self.finish_lookup(&ticket, result);
                }
            }
            view.send_if_modified(|shown| {
                if *shown == self.view {
                    return false;
                }
                *shown = self.view.clone();
                true
            });
        }
    }
}

/// One immediate lookup with the same length rule, cap and failure handling
/// as the debounced path.
pub async fn suggest_once<S: LocusService>(service: &S, query: &str) -> Vec<SuggestionCandidate> {
    if query.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }
    capped(service.geocode(query).await, query)
}

fn capped(result: Result<Vec<SuggestionCandidate>, LocusError>, query: &str) -> Vec<SuggestionCandidate> {
    match result {
        Ok(mut candidates) => {
            candidates.truncate(MAX_CANDIDATES);
            candidates
        }
        Err(e) => {
            log::warn!("Error fetching suggestions for \"{}\": {}", query, e);
            Vec::new()
        }
    }
}
