//! Per-session poll state machine.
//!
//! # Responsibility
//! - Seed and load the question set once, then serve selections.
//! - Gate selections on identity, buffering one pending vote.
//! - Track each question as unanswered, pending, answered or failed.
//!
//! # Invariants
//! - At most one buffered vote; a new selection replaces it.
//! - `Answered` is terminal for the session and identity; later selections
//!   are ignored until another identity is confirmed.
//! - A failed submission rolls the optimistic choice back and stays
//!   retryable; the cached aggregate is only replaced by store results.

use crate::model::question::{
    validate_question_set, OptionId, Question, QuestionId, QuestionValidationError,
};
use crate::model::vote::Aggregate;
use crate::repo::poll_store::PollStore;
use crate::service::vote_service::{VoteError, VoteService};
use crate::session::results::{derive_results, QuestionResults};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Ready,
}

/// Answer state of one question within a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionState {
    Unanswered,
    /// Optimistic choice awaiting store confirmation.
    Pending { option_id: OptionId },
    Answered { option_id: OptionId },
    /// Submission failed; rendered as unanswered and retryable.
    Failed { option_id: OptionId, reason: String },
}

impl QuestionState {
    /// Choice shown to the user, if any.
    pub fn selected(&self) -> Option<&str> {
        match self {
            Self::Pending { option_id } | Self::Answered { option_id } => {
                Some(option_id.as_str())
            }
            Self::Unanswered | Self::Failed { .. } => None,
        }
    }
}

/// Selection deferred until an identity is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVote {
    pub question_id: QuestionId,
    pub option_id: OptionId,
}

/// Result of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Vote confirmed; the cached aggregate now mirrors the store.
    Recorded,
    /// No identity yet; the selection was buffered and the prompt opened.
    IdentityRequired,
    /// Question already answered in this session; nothing submitted.
    AlreadyAnswered { option_id: OptionId },
    /// Store failure; the question is back to a retryable state.
    Failed { reason: String },
}

/// Session-level error.
#[derive(Debug)]
pub enum SessionError {
    NotReady,
    InvalidQuestion(QuestionValidationError),
    UnknownQuestion(QuestionId),
    UnknownOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
    NothingToRetry(QuestionId),
    Vote(VoteError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady => write!(f, "poll session is still loading"),
            Self::InvalidQuestion(err) => write!(f, "{err}"),
            Self::UnknownQuestion(id) => write!(f, "unknown question `{id}`"),
            Self::UnknownOption {
                question_id,
                option_id,
            } => write!(
                f,
                "option `{option_id}` does not belong to question `{question_id}`"
            ),
            Self::NothingToRetry(id) => write!(f, "question `{id}` has no failed vote to retry"),
            Self::Vote(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuestion(err) => Some(err),
            Self::Vote(err) => Some(err),
            _ => None,
        }
    }
}

impl From<VoteError> for SessionError {
    fn from(value: VoteError) -> Self {
        Self::Vote(value)
    }
}

impl From<QuestionValidationError> for SessionError {
    fn from(value: QuestionValidationError) -> Self {
        Self::InvalidQuestion(value)
    }
}

/// Reconciliation layer over a `VoteService`.
pub struct PollSession<S: PollStore> {
    service: VoteService<S>,
    questions: Vec<Question>,
    phase: SessionPhase,
    seeded: bool,
    aggregate: Aggregate,
    states: BTreeMap<QuestionId, QuestionState>,
    pending: Option<PendingVote>,
    identity_prompt_open: bool,
}

impl<S: PollStore> PollSession<S> {
    /// Creates a loading session after validating the question set.
    pub fn new(service: VoteService<S>, questions: Vec<Question>) -> Result<Self, SessionError> {
        validate_question_set(&questions)?;
        let states = questions
            .iter()
            .map(|question| (question.id.clone(), QuestionState::Unanswered))
            .collect();
        Ok(Self {
            service,
            questions,
            phase: SessionPhase::Loading,
            seeded: false,
            aggregate: Aggregate::new(),
            states,
            pending: None,
            identity_prompt_open: false,
        })
    }

    /// Seeds once, reads aggregate and ballots, then enters `Ready`.
    ///
    /// Calling again refreshes the cached aggregate and picks up ballots of
    /// the current identity without re-seeding.
    pub fn load(&mut self) -> Result<(), SessionError> {
        if !self.seeded {
            self.service.seed(&self.questions)?;
            self.seeded = true;
        }
        self.aggregate = self.service.aggregate()?;
        self.sync_ballots()?;
        self.phase = SessionPhase::Ready;
        info!(
            "event=session_load module=session status=ok questions={} options_tracked={}",
            self.questions.len(),
            self.aggregate.len()
        );
        Ok(())
    }

    /// Handles a user selecting `option_id` on `question_id`.
    pub fn select_option(
        &mut self,
        question_id: &str,
        option_id: &str,
    ) -> Result<SelectOutcome, SessionError> {
        if self.phase != SessionPhase::Ready {
            return Err(SessionError::NotReady);
        }
        let question = self
            .question(question_id)
            .ok_or_else(|| SessionError::UnknownQuestion(question_id.to_string()))?;
        if !question.has_option(option_id) {
            return Err(SessionError::UnknownOption {
                question_id: question_id.to_string(),
                option_id: option_id.to_string(),
            });
        }

        if let Some(QuestionState::Answered { option_id }) = self.states.get(question_id) {
            return Ok(SelectOutcome::AlreadyAnswered {
                option_id: option_id.clone(),
            });
        }

        match self.service.identity() {
            Ok(Some(_)) => Ok(self.execute_vote(question_id, option_id)),
            Ok(None) => {
                self.defer(question_id, option_id);
                Ok(SelectOutcome::IdentityRequired)
            }
            Err(err) => Ok(self.fail(question_id, option_id, err)),
        }
    }

    /// Persists the identity, then replays and clears the buffered vote.
    ///
    /// Switching to a different identity drops answer states of the previous
    /// one before its own ballots are read.
    ///
    /// Returns the replay outcome, or `None` when nothing was buffered.
    pub fn confirm_identity(&mut self, name: &str) -> Result<Option<SelectOutcome>, SessionError> {
        let previous = self.service.identity()?;
        let identity = self.service.set_identity(name)?;
        self.identity_prompt_open = false;
        if previous.is_some_and(|previous| previous != identity) {
            self.reset_answers();
        }
        if self.phase == SessionPhase::Ready {
            self.sync_ballots()?;
        }

        match self.pending.take() {
            Some(pending) => self
                .select_option(&pending.question_id, &pending.option_id)
                .map(Some),
            None => Ok(None),
        }
    }

    /// Closes the identity prompt; the buffered vote is kept.
    pub fn dismiss_identity_prompt(&mut self) {
        self.identity_prompt_open = false;
    }

    /// Resubmits the choice of a question whose submission failed.
    pub fn retry(&mut self, question_id: &str) -> Result<SelectOutcome, SessionError> {
        let option_id = match self.states.get(question_id) {
            Some(QuestionState::Failed { option_id, .. }) => option_id.clone(),
            _ => return Err(SessionError::NothingToRetry(question_id.to_string())),
        };
        self.select_option(question_id, &option_id)
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions
            .iter()
            .find(|question| question.id == question_id)
    }

    pub fn question_state(&self, question_id: &str) -> Option<&QuestionState> {
        self.states.get(question_id)
    }

    /// Cached aggregate last reconciled with the store.
    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    pub fn pending_vote(&self) -> Option<&PendingVote> {
        self.pending.as_ref()
    }

    pub fn identity_prompt_open(&self) -> bool {
        self.identity_prompt_open
    }

    pub fn service(&self) -> &VoteService<S> {
        &self.service
    }

    /// Render-ready results for one question.
    pub fn results(&self, question_id: &str) -> Option<QuestionResults> {
        let question = self.question(question_id)?;
        let selected = self
            .states
            .get(question_id)
            .and_then(QuestionState::selected);
        Some(derive_results(question, &self.aggregate, selected))
    }

    /// Render-ready results for every question, in input order.
    pub fn all_results(&self) -> Vec<QuestionResults> {
        self.questions
            .iter()
            .filter_map(|question| self.results(&question.id))
            .collect()
    }

    fn defer(&mut self, question_id: &str, option_id: &str) {
        self.pending = Some(PendingVote {
            question_id: question_id.to_string(),
            option_id: option_id.to_string(),
        });
        self.identity_prompt_open = true;
        info!("event=vote_deferred module=session status=identity_required question_id={question_id}");
    }

    fn execute_vote(&mut self, question_id: &str, option_id: &str) -> SelectOutcome {
        self.states.insert(
            question_id.to_string(),
            QuestionState::Pending {
                option_id: option_id.to_string(),
            },
        );

        match self.service.submit_vote(question_id, option_id) {
            Ok(aggregate) => {
                self.aggregate = aggregate;
                self.states.insert(
                    question_id.to_string(),
                    QuestionState::Answered {
                        option_id: option_id.to_string(),
                    },
                );
                SelectOutcome::Recorded
            }
            Err(VoteError::IdentityRequired) => {
                self.states
                    .insert(question_id.to_string(), QuestionState::Unanswered);
                self.defer(question_id, option_id);
                SelectOutcome::IdentityRequired
            }
            Err(err) => self.fail(question_id, option_id, err),
        }
    }

    fn fail(&mut self, question_id: &str, option_id: &str, err: VoteError) -> SelectOutcome {
        let reason = err.to_string();
        warn!(
            "event=vote_submit module=session status=error question_id={question_id} option_id={option_id} error={reason}"
        );
        self.states.insert(
            question_id.to_string(),
            QuestionState::Failed {
                option_id: option_id.to_string(),
                reason: reason.clone(),
            },
        );
        SelectOutcome::Failed { reason }
    }

    fn reset_answers(&mut self) {
        for state in self.states.values_mut() {
            *state = QuestionState::Unanswered;
        }
        info!("event=session_identity_switch module=session status=ok");
    }

    /// Marks questions answered where the current identity holds a ballot.
    fn sync_ballots(&mut self) -> Result<(), SessionError> {
        let ballots = self.service.ballots()?;
        for (question_id, option_id) in ballots.iter() {
            if let Some(state) = self.states.get_mut(question_id) {
                if !matches!(state, QuestionState::Answered { .. }) {
                    *state = QuestionState::Answered {
                        option_id: option_id.to_string(),
                    };
                }
            }
        }
        Ok(())
    }
}
