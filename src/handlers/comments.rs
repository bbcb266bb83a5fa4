use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    comment_tree::{
        self, DEFAULT_PAGE_SIZE, ListMode, ListOptions, Requester, RootOrder,
    },
    config::Config,
    error::AppError,
    models::comment::{CommentRow, CreateCommentRequest, UpdateCommentRequest},
    utils::{html::clean_html, jwt::Claims},
};

const COMMENT_COLUMNS: &str = "c.id, c.prompt_id, c.author_id, u.username AS author_username, \
     c.parent_comment_id, c.content, c.created_at, c.updated_at, c.deleted_at";

/// Query parameters for listing a prompt's comments.
#[derive(Debug, Deserialize)]
pub struct CommentListParams {
    #[serde(default)]
    pub mode: ListMode,
    /// Root ordering; replies are always oldest-first.
    #[serde(default)]
    pub order: RootOrder,
    /// 1-indexed page of root comments (tree mode).
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// List comments for a prompt, flat or as a nested tree.
///
/// Open to anonymous requesters. A bearer token, when present and valid,
/// only switches on the per-node editable/deletable flags; it never changes
/// which content is returned (deleted comments are redacted for everyone).
pub async fn list_comments(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Path(prompt_id): Path<i64>,
    Query(params): Query<CommentListParams>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    ensure_prompt_exists(&pool, prompt_id).await?;

    let rows = sqlx::query_as::<_, CommentRow>(&format!(
        r#"
        SELECT {COMMENT_COLUMNS}
        FROM comments c
        JOIN users u ON c.author_id = u.id
        WHERE c.prompt_id = $1
        ORDER BY c.created_at ASC, c.id ASC
        "#
    ))
    .bind(prompt_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch comments for prompt {}: {:?}", prompt_id, e);
        AppError::from(e)
    })?;

    let claims = crate::utils::jwt::claims_from_headers(&headers, &config.jwt_secret);
    let requester = Requester::from_claims(claims.as_ref());

    let opts = ListOptions {
        mode: params.mode,
        order: params.order,
        page: params.page.unwrap_or(1),
        page_size: params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    };

    let page = comment_tree::build_comment_page(&rows, opts, requester);

    Ok(Json(page))
}

/// Create a comment on a prompt, optionally as a reply.
/// Requires: Login.
pub async fn create_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(prompt_id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM prompts WHERE id = $1 AND deleted_at IS NULL")
        .bind(prompt_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Prompt not found".to_string()))?;

    // A reply's parent must exist and belong to the same prompt. Parents are
    // fixed at creation, which is what keeps the thread an acyclic tree.
    if let Some(parent_id) = payload.parent_comment_id {
        let parent_prompt_id: i64 =
            sqlx::query_scalar("SELECT prompt_id FROM comments WHERE id = $1")
                .bind(parent_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(AppError::NotFound("Parent comment not found".to_string()))?;

        if parent_prompt_id != prompt_id {
            return Err(AppError::BadRequest(
                "Parent comment does not belong to this prompt".to_string(),
            ));
        }
    }

    let comment_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO comments (prompt_id, author_id, parent_comment_id, content)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(prompt_id)
    .bind(user_id)
    .bind(payload.parent_comment_id)
    .bind(clean_html(&payload.content))
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE prompts SET comments_count = comments_count + 1 WHERE id = $1")
        .bind(prompt_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let comment = fetch_comment(&pool, comment_id)
        .await?
        .ok_or_else(|| AppError::InternalServerError("Comment vanished after insert".to_string()))?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Edit a comment's content.
/// Requires: Login + (Author OR Moderator/Admin).
/// Soft-deleted comments are no longer editable (their content is redacted).
pub async fn update_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path((prompt_id, comment_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let comment = fetch_comment(&pool, comment_id)
        .await?
        .filter(|c| c.prompt_id == prompt_id)
        .ok_or(AppError::NotFound("Comment not found".to_string()))?;

    if comment.author_id != claims.user_id() && !claims.is_moderator() {
        return Err(AppError::Forbidden(
            "You are not authorized to update this comment".to_string(),
        ));
    }

    if comment.deleted_at.is_some() {
        return Err(AppError::Gone("Comment no longer editable".to_string()));
    }

    sqlx::query("UPDATE comments SET content = $2, updated_at = NOW() WHERE id = $1")
        .bind(comment_id)
        .bind(clean_html(&payload.content))
        .execute(&pool)
        .await?;

    let updated = fetch_comment(&pool, comment_id)
        .await?
        .ok_or_else(|| AppError::InternalServerError("Comment vanished after update".to_string()))?;

    Ok(Json(updated))
}

/// Delete a comment (Soft Delete).
/// Requires: Login + (Author OR Moderator/Admin).
///
/// The row is kept so reply subtrees stay attached; list endpoints render it
/// redacted. Deleting an already-deleted comment is an idempotent no-op.
pub async fn delete_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path((prompt_id, comment_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let comment = fetch_comment(&pool, comment_id)
        .await?
        .filter(|c| c.prompt_id == prompt_id)
        .ok_or(AppError::NotFound("Comment not found".to_string()))?;

    if comment.author_id != claims.user_id() && !claims.is_moderator() {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this comment".to_string(),
        ));
    }

    if comment.deleted_at.is_none() {
        sqlx::query("UPDATE comments SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
            .bind(comment_id)
            .execute(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete comment {}: {:?}", comment_id, e);
                AppError::from(e)
            })?;
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_prompt_exists(pool: &PgPool, prompt_id: i64) -> Result<(), AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM prompts WHERE id = $1 AND deleted_at IS NULL")
        .bind(prompt_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Prompt not found".to_string()))?;
    Ok(())
}

async fn fetch_comment(pool: &PgPool, comment_id: i64) -> Result<Option<CommentRow>, AppError> {
    let row = sqlx::query_as::<_, CommentRow>(&format!(
        r#"
        SELECT {COMMENT_COLUMNS}
        FROM comments c
        JOIN users u ON c.author_id = u.id
        WHERE c.id = $1
        "#
    ))
    .bind(comment_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
