//! Identity, aggregate and ballot value types.
//!
//! # Invariants
//! - An `Identity` is never empty and carries normalized whitespace.
//! - `Aggregate` counts are non-negative; a missing entry reads as zero.
//! - `BallotSet` holds at most one choice per question.

use crate::model::question::{OptionId, Question, QuestionId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Display name a session declared before voting.
///
/// No uniqueness or verification: any non-empty name is a valid identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Normalizes and validates a display name.
    ///
    /// Leading/trailing whitespace is trimmed and inner whitespace runs
    /// (including newlines) collapse to one space.
    pub fn parse(name: &str) -> Result<Self, IdentityError> {
        let normalized = WHITESPACE_RE.replace_all(name.trim(), " ");
        if normalized.is_empty() {
            return Err(IdentityError::Empty);
        }
        Ok(Self(normalized.into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.0
    }
}

/// Rejected identity input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    Empty,
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "identity name cannot be empty"),
        }
    }
}

impl Error for IdentityError {}

/// Shared vote counts keyed by option id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aggregate {
    counts: BTreeMap<OptionId, u64>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for `option_id`; missing entries read as zero.
    pub fn count(&self, option_id: &str) -> u64 {
        self.counts.get(option_id).copied().unwrap_or(0)
    }

    /// Returns whether an entry exists, including explicit zero entries.
    pub fn contains(&self, option_id: &str) -> bool {
        self.counts.contains_key(option_id)
    }

    pub fn set(&mut self, option_id: impl Into<OptionId>, count: u64) {
        self.counts.insert(option_id.into(), count);
    }

    /// Sum of counts over every option of `question`.
    pub fn total_for(&self, question: &Question) -> u64 {
        question
            .options
            .iter()
            .map(|option| self.count(&option.id))
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts
            .iter()
            .map(|(option_id, count)| (option_id.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(OptionId, u64)> for Aggregate {
    fn from_iter<T: IntoIterator<Item = (OptionId, u64)>>(iter: T) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

/// One identity's choices, keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BallotSet {
    choices: BTreeMap<QuestionId, OptionId>,
}

impl BallotSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn choice(&self, question_id: &str) -> Option<&str> {
        self.choices.get(question_id).map(String::as_str)
    }

    /// Records a choice, returning the replaced one.
    pub fn record(
        &mut self,
        question_id: impl Into<QuestionId>,
        option_id: impl Into<OptionId>,
    ) -> Option<OptionId> {
        self.choices.insert(question_id.into(), option_id.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.choices
            .iter()
            .map(|(question_id, option_id)| (question_id.as_str(), option_id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

impl FromIterator<(QuestionId, OptionId)> for BallotSet {
    fn from_iter<T: IntoIterator<Item = (QuestionId, OptionId)>>(iter: T) -> Self {
        Self {
            choices: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_trims_and_collapses_whitespace() {
        let identity = Identity::parse("  Alice \n  Liddell ").expect("valid name");
        assert_eq!(identity.as_str(), "Alice Liddell");
    }

    #[test]
    fn identity_rejects_blank_names() {
        assert_eq!(Identity::parse(" \t\n"), Err(IdentityError::Empty));
        assert_eq!(Identity::parse(""), Err(IdentityError::Empty));
    }

    #[test]
    fn aggregate_reads_missing_entries_as_zero() {
        let mut aggregate = Aggregate::new();
        aggregate.set("opt-1", 3);
        assert_eq!(aggregate.count("opt-1"), 3);
        assert_eq!(aggregate.count("opt-404"), 0);
        assert!(!aggregate.contains("opt-404"));
    }

    #[test]
    fn ballot_record_replaces_prior_choice() {
        let mut ballots = BallotSet::new();
        assert_eq!(ballots.record("q1", "opt-1"), None);
        assert_eq!(ballots.record("q1", "opt-2"), Some("opt-1".to_string()));
        assert_eq!(ballots.len(), 1);
        assert_eq!(ballots.choice("q1"), Some("opt-2"));
    }
}
