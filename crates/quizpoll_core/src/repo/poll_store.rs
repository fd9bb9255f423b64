//! Poll store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist identity, shared vote counts and per-voter ballots.
//! - Expose atomic mutations instead of whole-map rewrites.
//!
//! # Invariants
//! - `apply_vote` moves the ballot and both counts as one unit; on failure
//!   nothing is changed.
//! - A released vote never takes a count below zero.
//! - `seed_counts` only inserts missing keys.
//! - Negative persisted counts are floored to zero on read.

use crate::db::{ensure_schema_ready, DbError};
use crate::model::question::OptionId;
use crate::model::vote::{Aggregate, BallotSet, Identity};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of the underlying persistence medium.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Medium unreachable (poisoned lock, simulated outage).
    Unavailable(String),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "poll store unavailable: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted poll data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Effect of one `apply_vote` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedVote {
    /// Choice replaced by this vote, `None` on a first vote.
    pub previous: Option<OptionId>,
    /// Count of the chosen option after the vote.
    pub count: u64,
}

/// Durable key-value surface behind the vote engine.
pub trait PollStore {
    /// Current session identity, `None` when never declared.
    fn identity(&self) -> StoreResult<Option<Identity>>;
    /// Persists `identity`, overwriting any previous one.
    fn set_identity(&self, identity: &Identity) -> StoreResult<()>;
    /// Full shared aggregate.
    fn aggregate(&self) -> StoreResult<Aggregate>;
    /// Inserts each seed whose option has no entry yet; returns inserted count.
    fn seed_counts(&self, seeds: &Aggregate) -> StoreResult<usize>;
    /// Ballots recorded by `voter`.
    fn ballots(&self, voter: &Identity) -> StoreResult<BallotSet>;
    /// Records `option_id` as `voter`'s choice for `question_id`, releases one
    /// vote of the replaced choice (floored at zero) and counts one for
    /// `option_id` (created at zero if missing), atomically.
    fn apply_vote(
        &self,
        voter: &Identity,
        question_id: &str,
        option_id: &str,
    ) -> StoreResult<AppliedVote>;
}

impl<S: PollStore + ?Sized> PollStore for &S {
    fn identity(&self) -> StoreResult<Option<Identity>> {
        (**self).identity()
    }

    fn set_identity(&self, identity: &Identity) -> StoreResult<()> {
        (**self).set_identity(identity)
    }

    fn aggregate(&self) -> StoreResult<Aggregate> {
        (**self).aggregate()
    }

    fn seed_counts(&self, seeds: &Aggregate) -> StoreResult<usize> {
        (**self).seed_counts(seeds)
    }

    fn ballots(&self, voter: &Identity) -> StoreResult<BallotSet> {
        (**self).ballots(voter)
    }

    fn apply_vote(
        &self,
        voter: &Identity,
        question_id: &str,
        option_id: &str,
    ) -> StoreResult<AppliedVote> {
        (**self).apply_vote(voter, question_id, option_id)
    }
}

impl<S: PollStore + ?Sized> PollStore for Arc<S> {
    fn identity(&self) -> StoreResult<Option<Identity>> {
        (**self).identity()
    }

    fn set_identity(&self, identity: &Identity) -> StoreResult<()> {
        (**self).set_identity(identity)
    }

    fn aggregate(&self) -> StoreResult<Aggregate> {
        (**self).aggregate()
    }

    fn seed_counts(&self, seeds: &Aggregate) -> StoreResult<usize> {
        (**self).seed_counts(seeds)
    }

    fn ballots(&self, voter: &Identity) -> StoreResult<BallotSet> {
        (**self).ballots(voter)
    }

    fn apply_vote(
        &self,
        voter: &Identity,
        question_id: &str,
        option_id: &str,
    ) -> StoreResult<AppliedVote> {
        (**self).apply_vote(voter, question_id, option_id)
    }
}

/// SQLite-backed poll store.
pub struct SqliteVoteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVoteStore<'conn> {
    /// Creates a store from a connection opened through `open_db*`.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_schema_ready(conn, &["local_identity", "vote_counts", "ballots"])?;
        Ok(Self { conn })
    }
}

impl PollStore for SqliteVoteStore<'_> {
    fn identity(&self) -> StoreResult<Option<Identity>> {
        let name: Option<String> = self
            .conn
            .query_row(
                "SELECT display_name FROM local_identity WHERE slot = 1;",
                [],
                |row| row.get(0),
            )
            .optional()?;

        name.map(|value| {
            Identity::parse(&value).map_err(|_| {
                StoreError::InvalidData("blank display_name in local_identity".to_string())
            })
        })
        .transpose()
    }

    fn set_identity(&self, identity: &Identity) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO local_identity (slot, display_name)
             VALUES (1, ?1)
             ON CONFLICT(slot) DO UPDATE SET
                display_name = excluded.display_name,
                updated_at = (strftime('%s', 'now') * 1000);",
            [identity.as_str()],
        )?;
        Ok(())
    }

    fn aggregate(&self) -> StoreResult<Aggregate> {
        let mut stmt = self
            .conn
            .prepare("SELECT option_id, vote_count FROM vote_counts ORDER BY option_id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut aggregate = Aggregate::new();
        while let Some(row) = rows.next()? {
            let option_id: String = row.get(0)?;
            let raw: i64 = row.get(1)?;
            let count = floor_count(&option_id, raw);
            aggregate.set(option_id, count);
        }
        Ok(aggregate)
    }

    fn seed_counts(&self, seeds: &Aggregate) -> StoreResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut inserted = 0;
        for (option_id, count) in seeds.iter() {
            inserted += tx.execute(
                "INSERT INTO vote_counts (option_id, vote_count)
                 VALUES (?1, ?2)
                 ON CONFLICT(option_id) DO NOTHING;",
                params![option_id, to_db_count(count)?],
            )?;
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn ballots(&self, voter: &Identity) -> StoreResult<BallotSet> {
        let mut stmt = self.conn.prepare(
            "SELECT question_id, option_id
             FROM ballots
             WHERE voter = ?1
             ORDER BY question_id ASC;",
        )?;
        let mut rows = stmt.query([voter.as_str()])?;
        let mut ballots = BallotSet::new();
        while let Some(row) = rows.next()? {
            let question_id: String = row.get(0)?;
            let option_id: String = row.get(1)?;
            ballots.record(question_id, option_id);
        }
        Ok(ballots)
    }

    fn apply_vote(
        &self,
        voter: &Identity,
        question_id: &str,
        option_id: &str,
    ) -> StoreResult<AppliedVote> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let previous: Option<String> = tx
            .query_row(
                "SELECT option_id FROM ballots WHERE voter = ?1 AND question_id = ?2;",
                params![voter.as_str(), question_id],
                |row| row.get(0),
            )
            .optional()?;
        tx.execute(
            "INSERT INTO ballots (voter, question_id, option_id)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(voter, question_id) DO UPDATE SET
                option_id = excluded.option_id,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![voter.as_str(), question_id, option_id],
        )?;
        if let Some(previous_option) = previous.as_deref() {
            release_vote(&tx, previous_option)?;
        }
        let count = count_vote(&tx, option_id)?;
        tx.commit()?;

        Ok(AppliedVote { previous, count })
    }
}

/// Adds one vote to `option_id`, treating a negative stored count as zero.
fn count_vote(conn: &Connection, option_id: &str) -> StoreResult<u64> {
    let raw: i64 = conn.query_row(
        "INSERT INTO vote_counts (option_id, vote_count)
         VALUES (?1, 1)
         ON CONFLICT(option_id) DO UPDATE SET
            vote_count = MAX(vote_count, 0) + 1,
            updated_at = (strftime('%s', 'now') * 1000)
         RETURNING vote_count;",
        [option_id],
        |row| row.get(0),
    )?;
    Ok(floor_count(option_id, raw))
}

/// Removes one vote from `option_id`; no-op at zero or for a missing entry.
fn release_vote(conn: &Connection, option_id: &str) -> StoreResult<()> {
    conn.execute(
        "UPDATE vote_counts
         SET vote_count = vote_count - 1,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE option_id = ?1
           AND vote_count > 0;",
        [option_id],
    )?;
    Ok(())
}

fn floor_count(option_id: &str, raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or_else(|_| {
        warn!("event=count_floor module=repo status=warn option_id={option_id} raw_count={raw}");
        0
    })
}

fn to_db_count(count: u64) -> StoreResult<i64> {
    i64::try_from(count)
        .map_err(|_| StoreError::InvalidData(format!("vote count {count} exceeds storage range")))
}
