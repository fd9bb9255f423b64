//! Comment use-case service.
//!
//! # Invariants
//! - Posting requires a declared identity; the author is that identity.
//! - Bodies are trimmed and must be non-empty.
//! - Comment bodies are never logged.

use crate::model::comment::Comment;
use crate::repo::comment_repo::CommentRepository;
use crate::repo::poll_store::{PollStore, StoreError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Comment use-case error.
#[derive(Debug)]
pub enum CommentError {
    IdentityRequired,
    EmptyBody,
    EmptyPageId,
    Store(StoreError),
}

impl Display for CommentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdentityRequired => write!(f, "an identity is required before commenting"),
            Self::EmptyBody => write!(f, "comment body cannot be empty"),
            Self::EmptyPageId => write!(f, "page id cannot be empty"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CommentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for CommentError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Comment service; identity is read from the poll store.
pub struct CommentService<R: CommentRepository, S: PollStore> {
    repo: R,
    identities: S,
}

impl<R: CommentRepository, S: PollStore> CommentService<R, S> {
    pub fn new(repo: R, identities: S) -> Self {
        Self { repo, identities }
    }

    /// Appends a comment authored by the current identity.
    pub fn post_comment(&self, page_id: &str, body: &str) -> Result<Comment, CommentError> {
        let page_id = page_id.trim();
        if page_id.is_empty() {
            return Err(CommentError::EmptyPageId);
        }
        let body = body.trim();
        if body.is_empty() {
            return Err(CommentError::EmptyBody);
        }
        let author = self
            .identities
            .identity()?
            .ok_or(CommentError::IdentityRequired)?;

        let comment = Comment {
            id: Uuid::new_v4(),
            page_id: page_id.to_string(),
            author: author.into(),
            body: body.to_string(),
            created_at: now_epoch_ms(),
        };
        self.repo.append_comment(&comment)?;
        info!(
            "event=comment_post module=service status=ok page_id={} comment_id={}",
            comment.page_id, comment.id
        );
        Ok(comment)
    }

    /// Lists comments of `page_id`, newest first.
    pub fn list_comments(&self, page_id: &str) -> Result<Vec<Comment>, CommentError> {
        Ok(self.repo.list_comments(page_id.trim())?)
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
