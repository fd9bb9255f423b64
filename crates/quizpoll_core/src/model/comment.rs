//! Comment log entry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable comment identifier.
pub type CommentId = Uuid;

/// One append-only comment on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub page_id: String,
    /// Display name of the identity that posted the comment.
    pub author: String,
    pub body: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}
