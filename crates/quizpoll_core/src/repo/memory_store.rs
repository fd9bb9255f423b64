//! In-process poll store.
//!
//! # Responsibility
//! - Back sessions and tests without a database file.
//! - Simulate an unavailable medium on demand.
//!
//! # Invariants
//! - Every trait operation runs inside one mutex critical section, so count
//!   and ballot mutations are atomic across threads.

use crate::model::question::OptionId;
use crate::model::vote::{Aggregate, BallotSet, Identity};
use crate::repo::poll_store::{AppliedVote, PollStore, StoreError, StoreResult};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    identity: Option<Identity>,
    counts: BTreeMap<OptionId, u64>,
    ballots: BTreeMap<Identity, BallotSet>,
}

/// Mutex-guarded poll store, `Send + Sync`.
#[derive(Debug, Default)]
pub struct MemoryVoteStore {
    state: Mutex<MemoryState>,
    offline: AtomicBool,
}

impl MemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `aggregate`.
    pub fn with_aggregate(aggregate: &Aggregate) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            state.counts = aggregate
                .iter()
                .map(|(option_id, count)| (option_id.to_string(), count))
                .collect();
        }
        store
    }

    /// Toggles a simulated outage; while offline every operation fails with
    /// `StoreError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

impl PollStore for MemoryVoteStore {
    fn identity(&self) -> StoreResult<Option<Identity>> {
        Ok(self.lock()?.identity.clone())
    }

    fn set_identity(&self, identity: &Identity) -> StoreResult<()> {
        self.lock()?.identity = Some(identity.clone());
        Ok(())
    }

    fn aggregate(&self) -> StoreResult<Aggregate> {
        let state = self.lock()?;
        Ok(state
            .counts
            .iter()
            .map(|(option_id, count)| (option_id.clone(), *count))
            .collect())
    }

    fn seed_counts(&self, seeds: &Aggregate) -> StoreResult<usize> {
        let mut state = self.lock()?;
        let mut inserted = 0;
        for (option_id, count) in seeds.iter() {
            if !state.counts.contains_key(option_id) {
                state.counts.insert(option_id.to_string(), count);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn ballots(&self, voter: &Identity) -> StoreResult<BallotSet> {
        Ok(self
            .lock()?
            .ballots
            .get(voter)
            .cloned()
            .unwrap_or_default())
    }

    fn apply_vote(
        &self,
        voter: &Identity,
        question_id: &str,
        option_id: &str,
    ) -> StoreResult<AppliedVote> {
        let mut state = self.lock()?;
        let previous = state
            .ballots
            .entry(voter.clone())
            .or_default()
            .record(question_id, option_id);
        if let Some(previous_option) = previous.as_deref() {
            if let Some(released) = state.counts.get_mut(previous_option) {
                *released = released.saturating_sub(1);
            }
        }
        let count = state.counts.entry(option_id.to_string()).or_insert(0);
        *count = count.saturating_add(1);

        Ok(AppliedVote {
            previous,
            count: *count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revote_moves_one_vote_to_new_choice() {
        let store = MemoryVoteStore::new();
        let voter = Identity::parse("Alice").unwrap();

        let first = store.apply_vote(&voter, "q1", "opt-1").unwrap();
        assert_eq!(first, AppliedVote { previous: None, count: 1 });

        let second = store.apply_vote(&voter, "q1", "opt-2").unwrap();
        assert_eq!(second.previous.as_deref(), Some("opt-1"));
        let aggregate = store.aggregate().unwrap();
        assert_eq!(aggregate.count("opt-1"), 0);
        assert_eq!(aggregate.count("opt-2"), 1);
    }

    #[test]
    fn offline_vote_leaves_ballot_and_counts_untouched() {
        let store = MemoryVoteStore::new();
        let voter = Identity::parse("Alice").unwrap();
        store.apply_vote(&voter, "q1", "opt-1").unwrap();

        store.set_offline(true);
        assert!(store.apply_vote(&voter, "q1", "opt-2").is_err());
        store.set_offline(false);

        assert_eq!(store.ballots(&voter).unwrap().choice("q1"), Some("opt-1"));
        assert_eq!(store.aggregate().unwrap().count("opt-1"), 1);
        assert!(!store.aggregate().unwrap().contains("opt-2"));
    }

    #[test]
    fn offline_store_rejects_operations() {
        let store = MemoryVoteStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.aggregate(),
            Err(StoreError::Unavailable(_))
        ));
        store.set_offline(false);
        assert!(store.aggregate().unwrap().is_empty());
    }
}
