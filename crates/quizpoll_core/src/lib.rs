//! Core vote-aggregation engine for QuizPoll.
//! This crate owns every voting invariant; callers only render its output.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;

pub use config::{ConfigError, PollConfig, SeedRange};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::comment::{Comment, CommentId};
pub use model::question::{
    parse_question_set, validate_question_set, AnswerOption, OptionId, Question, QuestionId,
    QuestionKind, QuestionValidationError,
};
pub use model::vote::{Aggregate, BallotSet, Identity, IdentityError};
pub use repo::comment_repo::{CommentRepository, SqliteCommentRepository};
pub use repo::memory_store::MemoryVoteStore;
pub use repo::poll_store::{AppliedVote, PollStore, SqliteVoteStore, StoreError, StoreResult};
pub use service::comment_service::{CommentError, CommentService};
pub use service::vote_service::{VoteError, VoteResult, VoteService};
pub use session::poll_session::{
    PendingVote, PollSession, QuestionState, SelectOutcome, SessionError, SessionPhase,
};
pub use session::results::{
    derive_results, percentage, Feedback, OptionMark, OptionResult, QuestionResults,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
