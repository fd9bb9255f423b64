//! Comment log repository.
//!
//! # Invariants
//! - Comments are append-only; there is no update or delete path.
//! - Listing is newest first; comments sharing a timestamp list in reverse
//!   insertion order.

use crate::db::ensure_schema_ready;
use crate::model::comment::Comment;
use crate::repo::poll_store::{StoreError, StoreResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// Repository interface for per-page comment threads.
pub trait CommentRepository {
    fn append_comment(&self, comment: &Comment) -> StoreResult<()>;
    fn list_comments(&self, page_id: &str) -> StoreResult<Vec<Comment>>;
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_schema_ready(conn, &["comments"])?;
        Ok(Self { conn })
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn append_comment(&self, comment: &Comment) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO comments (comment_uuid, page_id, author, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                comment.id.to_string(),
                comment.page_id.as_str(),
                comment.author.as_str(),
                comment.body.as_str(),
                comment.created_at,
            ],
        )?;
        Ok(())
    }

    fn list_comments(&self, page_id: &str) -> StoreResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(
            "SELECT comment_uuid, page_id, author, body, created_at
             FROM comments
             WHERE page_id = ?1
             ORDER BY created_at DESC, rowid DESC;",
        )?;
        let mut rows = stmt.query([page_id])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }
}

fn parse_comment_row(row: &Row<'_>) -> StoreResult<Comment> {
    let uuid_text: String = row.get("comment_uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid `{uuid_text}` in comments.comment_uuid"))
    })?;

    Ok(Comment {
        id,
        page_id: row.get("page_id")?,
        author: row.get("author")?,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
    })
}
