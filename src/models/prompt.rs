use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'prompts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Prompt {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub content: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,

    pub upvotes_count: i32,
    pub comments_count: i32,
    pub view_count: i32,
}

/// DTO for creating a new prompt.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePromptRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Title length must be between 1 and 255 chars"
    ))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 chars"))]
    pub description: Option<String>,

    #[validate(length(
        min = 1,
        max = 20000,
        message = "Content length must be between 1 and 20000 chars"
    ))]
    pub content: String,
}

/// DTO for updating an existing prompt. All fields optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePromptRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 20000))]
    pub content: Option<String>,
}

/// Query parameters for listing prompts.
#[derive(Debug, Deserialize)]
pub struct PromptListParams {
    /// Cursor for pagination: the created_at timestamp of the last prompt in the previous page.
    pub cursor: Option<chrono::DateTime<chrono::Utc>>,

    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,

    /// Search keyword matched against the title.
    pub q: Option<String>,
}
