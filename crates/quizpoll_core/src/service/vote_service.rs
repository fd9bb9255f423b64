//! Vote use-case service.
//!
//! # Responsibility
//! - Gate voting on a declared identity.
//! - Seed never-voted options once per question set.
//! - Run the submission protocol: swap ballot, release the prior vote,
//!   count the new one as one store unit, return the refreshed aggregate.
//!
//! # Invariants
//! - One ballot per (identity, question); the latest submission wins.
//! - A revision moves exactly one vote; the question total is unchanged.
//! - Counts never drop below zero.
//! - A failed submission changes neither ballots nor counts, so resubmitting
//!   the same choice is safe.
//! - Option membership is not checked here; `PollSession` validates it.

use crate::config::PollConfig;
use crate::model::question::Question;
use crate::model::vote::{Aggregate, BallotSet, Identity, IdentityError};
use crate::repo::poll_store::{PollStore, StoreError};
use crate::service::seeding::plan_seeds;
use log::{debug, info};
use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Vote use-case error.
#[derive(Debug)]
pub enum VoteError {
    /// Submission attempted before an identity was declared.
    IdentityRequired,
    InvalidIdentity(IdentityError),
    Store(StoreError),
}

impl Display for VoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdentityRequired => write!(f, "an identity is required before voting"),
            Self::InvalidIdentity(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IdentityRequired => None,
            Self::InvalidIdentity(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for VoteError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<IdentityError> for VoteError {
    fn from(value: IdentityError) -> Self {
        Self::InvalidIdentity(value)
    }
}

pub type VoteResult<T> = Result<T, VoteError>;

/// Use-case service over a `PollStore`.
pub struct VoteService<S: PollStore> {
    store: S,
    config: PollConfig,
}

impl<S: PollStore> VoteService<S> {
    /// Creates a service with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, PollConfig::default())
    }

    pub fn with_config(store: S, config: PollConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Current identity; `None` is an expected state, not an error.
    pub fn identity(&self) -> VoteResult<Option<Identity>> {
        Ok(self.store.identity()?)
    }

    /// Normalizes and persists `name`, replacing any previous identity.
    pub fn set_identity(&self, name: &str) -> VoteResult<Identity> {
        let identity = Identity::parse(name)?;
        self.store.set_identity(&identity)?;
        info!("event=identity_set module=service status=ok");
        Ok(identity)
    }

    /// Seeds missing options with random counts from the configured range.
    pub fn seed(&self, questions: &[Question]) -> VoteResult<usize> {
        self.seed_with_rng(questions, &mut rand::thread_rng())
    }

    /// Seeds missing options using the provided random source.
    ///
    /// # Contract
    /// - Existing entries are never overwritten; repeated calls are no-ops.
    /// - Only newly seeded keys are written back.
    /// - Returns the number of options seeded by this call.
    pub fn seed_with_rng<R: Rng>(
        &self,
        questions: &[Question],
        rng: &mut R,
    ) -> VoteResult<usize> {
        let existing = self.store.aggregate()?;
        let planned = plan_seeds(questions, &existing, self.config.seed_range, rng);
        if planned.is_empty() {
            debug!("event=vote_seed module=service status=skipped questions={}", questions.len());
            return Ok(0);
        }

        let inserted = self.store.seed_counts(&planned)?;
        info!(
            "event=vote_seed module=service status=ok questions={} seeded={inserted}",
            questions.len()
        );
        Ok(inserted)
    }

    /// Full shared aggregate.
    pub fn aggregate(&self) -> VoteResult<Aggregate> {
        Ok(self.store.aggregate()?)
    }

    /// Ballots of the current identity; empty when no identity is declared.
    pub fn ballots(&self) -> VoteResult<BallotSet> {
        match self.store.identity()? {
            Some(identity) => Ok(self.store.ballots(&identity)?),
            None => Ok(BallotSet::new()),
        }
    }

    /// Records the current identity's vote and returns the refreshed aggregate.
    ///
    /// # Contract
    /// - Fails with `IdentityRequired` before touching counts or ballots.
    /// - A prior choice for `question_id` loses one vote (floored at 0).
    /// - `option_id` gains one vote, created at zero if missing.
    /// - Re-voting the same option runs the full cycle; net count unchanged.
    pub fn submit_vote(&self, question_id: &str, option_id: &str) -> VoteResult<Aggregate> {
        let identity = self.store.identity()?.ok_or(VoteError::IdentityRequired)?;
        self.submit_vote_as(&identity, question_id, option_id)
    }

    /// Records a vote for an explicit `voter`, bypassing the stored identity.
    ///
    /// Lets several voters share one store concurrently, since the stored
    /// identity is a single slot.
    pub fn submit_vote_as(
        &self,
        voter: &Identity,
        question_id: &str,
        option_id: &str,
    ) -> VoteResult<Aggregate> {
        let started_at = Instant::now();
        let applied = self.store.apply_vote(voter, question_id, option_id)?;
        let aggregate = self.store.aggregate()?;

        info!(
            "event=vote_submit module=service status=ok question_id={question_id} option_id={option_id} revised={} count={} duration_ms={}",
            applied.previous.is_some(),
            applied.count,
            started_at.elapsed().as_millis()
        );
        Ok(aggregate)
    }
}
