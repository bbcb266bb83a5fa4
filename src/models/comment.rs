use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A 'comments' row joined with the author's username.
///
/// Fetched without any deleted-filtering: soft-deleted rows must reach the
/// tree builder so reply subtrees stay attached (redaction happens there).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: i64,
    pub prompt_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub parent_comment_id: Option<i64>,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 5000,
        message = "Comment must be between 1 and 5000 characters"
    ))]
    pub content: String,

    /// Optional: the ID of the comment being replied to.
    pub parent_comment_id: Option<i64>,
}

/// DTO for editing a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(
        min = 1,
        max = 5000,
        message = "Comment must be between 1 and 5000 characters"
    ))]
    pub content: String,
}
