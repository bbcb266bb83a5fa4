use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::prompt::{CreatePromptRequest, Prompt, PromptListParams, UpdatePromptRequest},
    utils::{html::clean_html, jwt::Claims},
};

const PROMPT_COLUMNS: &str = "id, author_id, title, description, content, \
     created_at, updated_at, deleted_at, upvotes_count, comments_count, view_count";

/// Create a new prompt.
/// Requires: Login.
pub async fn create_prompt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePromptRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let prompt = sqlx::query_as::<_, Prompt>(&format!(
        r#"
        INSERT INTO prompts (author_id, title, description, content)
        VALUES ($1, $2, $3, $4)
        RETURNING {PROMPT_COLUMNS}
        "#
    ))
    .bind(claims.user_id())
    .bind(&payload.title)
    .bind(payload.description.as_deref().map(clean_html))
    .bind(clean_html(&payload.content))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create prompt: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(prompt)))
}

/// List prompts (Recent first).
/// Filters out soft-deleted prompts.
/// Supports cursor-based pagination and an optional title keyword.
pub async fn list_prompts(
    State(pool): State<PgPool>,
    Query(params): Query<PromptListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let prompts = sqlx::query_as::<_, Prompt>(&format!(
        r#"
        SELECT {PROMPT_COLUMNS}
        FROM prompts
        WHERE deleted_at IS NULL
          AND ($1::TIMESTAMPTZ IS NULL OR created_at < $1)
          AND ($2::TEXT IS NULL OR title ILIKE '%' || $2 || '%')
        ORDER BY created_at DESC
        LIMIT $3
        "#
    ))
    .bind(params.cursor)
    .bind(params.q)
    .bind(limit)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list prompts: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(prompts))
}

/// Get a single prompt by ID, bumping its view counter.
pub async fn get_prompt(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let prompt = sqlx::query_as::<_, Prompt>(&format!(
        r#"
        UPDATE prompts
        SET view_count = view_count + 1
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {PROMPT_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Prompt not found".to_string()))?;

    Ok(Json(prompt))
}

/// Update a prompt.
/// Requires: Login + (Author OR Moderator/Admin).
pub async fn update_prompt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePromptRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let author_id: i64 = sqlx::query_scalar(
        "SELECT author_id FROM prompts WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Prompt not found".to_string()))?;

    if author_id != claims.user_id() && !claims.is_moderator() {
        return Err(AppError::Forbidden(
            "You are not authorized to update this prompt".to_string(),
        ));
    }

    let prompt = sqlx::query_as::<_, Prompt>(&format!(
        r#"
        UPDATE prompts
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            content = COALESCE($4, content),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {PROMPT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(payload.title)
    .bind(payload.description.as_deref().map(clean_html))
    .bind(payload.content.as_deref().map(clean_html))
    .fetch_one(&pool)
    .await?;

    Ok(Json(prompt))
}

/// Delete a prompt (Soft Delete).
/// Requires: Login + (Author OR Moderator/Admin).
pub async fn delete_prompt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let author_id: i64 = sqlx::query_scalar(
        "SELECT author_id FROM prompts WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Prompt not found".to_string()))?;

    if author_id != claims.user_id() && !claims.is_moderator() {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this prompt".to_string(),
        ));
    }

    sqlx::query("UPDATE prompts SET deleted_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete prompt: {:?}", e);
            AppError::from(e)
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Toggle the requester's upvote on a prompt.
pub async fn toggle_upvote(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(prompt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM prompts WHERE id = $1 AND deleted_at IS NULL")
        .bind(prompt_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Prompt not found".to_string()))?;

    let existing = sqlx::query(
        "SELECT 1 FROM prompt_upvotes WHERE user_id = $1 AND prompt_id = $2",
    )
    .bind(user_id)
    .bind(prompt_id)
    .fetch_optional(&mut *tx)
    .await?;

    let is_upvoted = existing.is_some();

    if is_upvoted {
        sqlx::query("DELETE FROM prompt_upvotes WHERE user_id = $1 AND prompt_id = $2")
            .bind(user_id)
            .bind(prompt_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE prompts SET upvotes_count = GREATEST(0, upvotes_count - 1) WHERE id = $1",
        )
        .bind(prompt_id)
        .execute(&mut *tx)
        .await?;
    } else {
        sqlx::query("INSERT INTO prompt_upvotes (user_id, prompt_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(prompt_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if e.to_string().contains("unique constraint")
                    || e.to_string().contains("23505")
                {
                    // Concurrent request handled gracefully
                    return AppError::Conflict("Already upvoted".to_string());
                }
                AppError::from(e)
            })?;

        sqlx::query("UPDATE prompts SET upvotes_count = upvotes_count + 1 WHERE id = $1")
            .bind(prompt_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(Json(serde_json::json!({ "upvoted": !is_upvoted })))
}
