use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    likes,
    models::{
        comment::{Comment, CommentView, CreateCommentRequest},
        like::{EntityKind, LikeStatus, SetLikeStatusRequest},
    },
    utils::{
        html::clean_html,
        jwt::{Claims, maybe_viewer},
    },
};

async fn find_active_comment(pool: &PgPool, id: Uuid) -> Result<Comment, AppError> {
    sqlx::query_as::<_, Comment>(
        "SELECT id, content, post_id, user_id, user_login, created_at
         FROM comments
         WHERE id = $1 AND deletion_status = 'active'",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Comment not found".to_string()))
}

/// Retrieves a single comment with the viewer's reaction state.
pub async fn get_comment(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let comment = find_active_comment(&pool, id).await?;

    let viewer_id = maybe_viewer(&headers, &config.jwt_secret)
        .and_then(|claims| claims.user_id().ok());
    let info = likes::likes_info(&pool, comment.id, viewer_id).await?;

    Ok(Json(CommentView::from_row(comment, info)))
}

/// Updates a comment's content.
/// Requires login; only the author may edit.
pub async fn update_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let comment = find_active_comment(&pool, id).await?;

    if comment.user_id != claims.user_id()? {
        return Err(AppError::Forbidden(
            "You are not the author of this comment".to_string(),
        ));
    }

    sqlx::query("UPDATE comments SET content = $1 WHERE id = $2")
        .bind(clean_html(&payload.content))
        .bind(comment.id)
        .execute(&pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Soft-deletes a comment and its reaction rows in one transaction.
/// Requires login; the author or an admin may delete.
pub async fn delete_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let comment = find_active_comment(&pool, id).await?;

    if comment.user_id != claims.user_id()? && claims.role != "admin" {
        return Err(AppError::Forbidden(
            "You are not the author of this comment".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    likes::remove_entity_likes(&mut *tx, comment.id, EntityKind::Comment).await?;

    sqlx::query("UPDATE comments SET deletion_status = 'deleted' WHERE id = $1")
        .bind(comment.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to delete comment: {:?}", e);
        AppError::from(e)
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Sets the caller's like status on a comment.
/// Requires login.
pub async fn set_comment_like_status(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetLikeStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status = LikeStatus::parse(&payload.like_status)
        .ok_or(AppError::BadRequest("Invalid like status".to_string()))?;

    let comment = find_active_comment(&pool, id).await?;
    let user_id = claims.user_id()?;

    likes::set_like_status(
        &pool,
        comment.id,
        EntityKind::Comment,
        user_id,
        &claims.login,
        status,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
