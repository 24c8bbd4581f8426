use super::constraint::{Constraint, Coord};
use std::{iter, sync::Arc};
use tokio::sync::watch;

/// One published version of the constraint list.
#[derive(Debug, Clone, Default)]
pub struct ConstraintList {
    version: u64,
    items: Arc<Vec<Constraint>>,
}

impl ConstraintList {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn items(&self) -> &[Constraint] {
        &self.items
    }

    pub fn shared_items(&self) -> Arc<Vec<Constraint>> {
        Arc::clone(&self.items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when both snapshots refer to the same list object.
    pub fn same_list(&self, other: &ConstraintList) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }

    fn replace(&mut self, items: Vec<Constraint>) {
        self.items = Arc::new(items);
        self.version += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The list moved on since the request was made.
    Stale,
    /// Every resolved coordinate already matched the stored one.
    Unchanged,
    Updated { version: u64 },
}

/// Owner of the ordered constraint list. Every mutation replaces the whole
/// list and publishes it to subscribers; no-ops publish nothing.
#[derive(Debug, Clone)]
pub struct ConstraintStore {
    tx: Arc<watch::Sender<ConstraintList>>,
}

impl Default for ConstraintStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConstraintList::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> ConstraintList {
        self.tx.borrow().clone()
    }

    pub fn version(&self) -> u64 {
        self.tx.borrow().version
    }

    pub fn subscribe(&self) -> watch::Receiver<ConstraintList> {
        self.tx.subscribe()
    }

    /// Adds a constraint at the end. Coordinates only ever come from
    /// reconciliation, so any the caller set are dropped.
    pub fn append(&self, constraint: Constraint) -> u64 {
        let constraint = Constraint {
            coordinates: None,
            ..constraint
        };
        let mut version = 0;
        self.tx.send_modify(|list| {
            let mut items = list.items.as_ref().clone();
            items.push(constraint);
            list.replace(items);
            version = list.version;
        });
        log::debug!("[STORE] appended constraint, now at version {}", version);
        version
    }

    /// Removes the constraint at `index`. Out-of-range indices are ignored.
    pub fn remove_at(&self, index: usize) -> bool {
        self.tx.send_if_modified(|list| {
            if index >= list.items.len() {
                return false;
            }
            let mut items = list.items.as_ref().clone();
            items.remove(index);
            list.replace(items);
            true
        })
    }

    pub fn clear(&self) -> bool {
        self.tx.send_if_modified(|list| {
            if list.items.is_empty() {
                return false;
            }
            list.replace(Vec::new());
            true
        })
    }

    /// Merges service-resolved coordinates into the list built at
    /// `expected_version`. The list object is only replaced when some
    /// coordinate actually differs from what is stored.
    pub fn reconcile(&self, expected_version: u64, resolved: &[Option<Coord>]) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::Stale;
        self.tx.send_if_modified(|list| {
            if list.version != expected_version {
                return false;
            }
            match merge_coordinates(&list.items, resolved) {
                Some(items) => {
                    list.replace(items);
                    outcome = ReconcileOutcome::Updated {
                        version: list.version,
                    };
                    true
                }
                None => {
                    outcome = ReconcileOutcome::Unchanged;
                    false
                }
            }
        });
        outcome
    }
}

/// Returns the merged list when at least one index resolves to coordinates
/// that are missing or different in `current`; `None` otherwise. Resolved
/// entries past the end of `current` are ignored.
pub fn merge_coordinates(current: &[Constraint], resolved: &[Option<Coord>]) -> Option<Vec<Constraint>> {
    let differs = current
        .iter()
        .zip(resolved)
        .any(|(stored, incoming)| match (incoming, stored.coordinates) {
            (Some(_), None) => true,
            (Some(new), Some(old)) => *new != old,
            (None, _) => false,
        });
    if !differs {
        return None;
    }
    let padded = resolved.iter().chain(iter::repeat(&None));
    Some(
        current
            .iter()
            .zip(padded)
            .map(|(stored, incoming)| Constraint {
                coordinates: incoming.or(stored.coordinates),
                ..stored.clone()
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::locus::constraint::TravelMode;

    fn constraint(address: &str) -> Constraint {
        Constraint::new(address, TravelMode::Driving, 10, 2)
    }

    fn store_with(addresses: &[&str]) -> ConstraintStore {
        let store = ConstraintStore::new();
        for address in addresses {
            store.append(constraint(address));
        }
        store
    }

    #[test]
    fn test_append_bumps_version() {
        let store = ConstraintStore::new();
        assert_eq!(store.version(), 0);
        assert_eq!(store.append(constraint("A")), 1);
        assert_eq!(store.append(constraint("B")), 2);
        let addresses: Vec<_> = store.snapshot().items().iter().map(|c| c.address.clone()).collect();
        assert_eq!(addresses, vec!["A", "B"]);
    }

    #[test]
    fn test_append_drops_caller_coordinates() {
        let store = ConstraintStore::new();
        store.append(Constraint {
            coordinates: Some((99.0, 9.0)),
            ..constraint("A")
        });
        assert_eq!(store.snapshot().items()[0].coordinates, None);
    }

    #[test]
    fn test_remove_preserves_order() {
        let store = store_with(&["A", "B", "C"]);
        let before = store.snapshot();
        assert!(store.remove_at(1));
        let after = store.snapshot();
        assert_eq!(after.items(), &[before.items()[0].clone(), before.items()[2].clone()]);
        assert_eq!(after.version(), before.version() + 1);
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let store = store_with(&["A"]);
        let mut rx = store.subscribe();
        let before = store.snapshot();
        assert!(!store.remove_at(3));
        assert!(!rx.has_changed().unwrap());
        assert!(store.snapshot().same_list(&before));
    }

    #[test]
    fn test_clear_empty_list_is_noop() {
        let store = ConstraintStore::new();
        assert!(!store.clear());
        let store = store_with(&["A", "B"]);
        assert!(store.clear());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_reconcile_fills_missing_coordinates() {
        let store = store_with(&["A", "B"]);
        let version = store.version();
        let outcome = store.reconcile(version, &[Some((1.0, 2.0)), None]);
        assert_eq!(outcome, ReconcileOutcome::Updated { version: version + 1 });
        let items = store.snapshot();
        assert_eq!(items.items()[0].coordinates, Some((1.0, 2.0)));
        assert_eq!(items.items()[1].coordinates, None);
    }

    #[test]
    fn test_reconcile_is_idempotent_once_converged() {
        let store = store_with(&["A", "B"]);
        let resolved = [Some((1.0, 2.0)), Some((3.0, 4.0))];
        store.reconcile(store.version(), &resolved);

        let converged = store.snapshot();
        let mut rx = store.subscribe();
        let outcome = store.reconcile(converged.version(), &resolved);
        assert_eq!(outcome, ReconcileOutcome::Unchanged);
        assert!(store.snapshot().same_list(&converged));
        assert_eq!(store.version(), converged.version());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_reconcile_detects_moved_coordinates() {
        let store = store_with(&["A"]);
        store.reconcile(store.version(), &[Some((1.0, 2.0))]);
        let outcome = store.reconcile(store.version(), &[Some((1.0, 2.5))]);
        assert!(matches!(outcome, ReconcileOutcome::Updated { .. }));
        assert_eq!(store.snapshot().items()[0].coordinates, Some((1.0, 2.5)));
    }

    #[test]
    fn test_reconcile_against_old_version_is_stale() {
        let store = store_with(&["A"]);
        let old = store.version();
        store.append(constraint("B"));
        let outcome = store.reconcile(old, &[Some((1.0, 2.0))]);
        assert_eq!(outcome, ReconcileOutcome::Stale);
        assert_eq!(store.snapshot().items()[0].coordinates, None);
    }

    #[test]
    fn test_merge_keeps_stored_value_where_response_has_none() {
        let mut current = vec![constraint("A"), constraint("B")];
        current[0].coordinates = Some((5.0, 5.0));
        let merged = merge_coordinates(&current, &[None, Some((7.0, 8.0))]).unwrap();
        assert_eq!(merged[0].coordinates, Some((5.0, 5.0)));
        assert_eq!(merged[1].coordinates, Some((7.0, 8.0)));
    }

    #[test]
    fn test_merge_ignores_entries_past_the_end() {
        let current = vec![constraint("A")];
        assert!(merge_coordinates(&current, &[None, Some((1.0, 1.0))]).is_none());
    }
}
