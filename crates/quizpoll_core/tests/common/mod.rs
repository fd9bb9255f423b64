use quizpoll_core::{
    Aggregate, AppliedVote, BallotSet, Identity, MemoryVoteStore, PollStore, StoreError,
    StoreResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Commits votes but reports an outage for the next `n` of them.
pub struct LossyStore {
    inner: MemoryVoteStore,
    lost_replies: AtomicUsize,
}

impl LossyStore {
    pub fn new(inner: MemoryVoteStore) -> Self {
        Self {
            inner,
            lost_replies: AtomicUsize::new(0),
        }
    }

    pub fn lose_next_replies(&self, count: usize) {
        self.lost_replies.store(count, Ordering::SeqCst);
    }
}

impl PollStore for LossyStore {
    fn identity(&self) -> StoreResult<Option<Identity>> {
        self.inner.identity()
    }

    fn set_identity(&self, identity: &Identity) -> StoreResult<()> {
        self.inner.set_identity(identity)
    }

    fn aggregate(&self) -> StoreResult<Aggregate> {
        self.inner.aggregate()
    }

    fn seed_counts(&self, seeds: &Aggregate) -> StoreResult<usize> {
        self.inner.seed_counts(seeds)
    }

    fn ballots(&self, voter: &Identity) -> StoreResult<BallotSet> {
        self.inner.ballots(voter)
    }

    fn apply_vote(
        &self,
        voter: &Identity,
        question_id: &str,
        option_id: &str,
    ) -> StoreResult<AppliedVote> {
        let applied = self.inner.apply_vote(voter, question_id, option_id)?;
        let lost = self
            .lost_replies
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lost {
            return Err(StoreError::Unavailable("reply lost".to_string()));
        }
        Ok(applied)
    }
}
