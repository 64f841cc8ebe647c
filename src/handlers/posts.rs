use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    handlers::blogs::find_active_blog,
    likes,
    models::{
        comment::{COMMENT_SORT_FIELDS, Comment, CommentView, CreateCommentRequest},
        like::{EntityKind, ExtendedLikesInfo, LikeStatus, LikesInfo, SetLikeStatusRequest},
        page::{Page, PageQuery},
        post::{CreatePostByBlogIdRequest, POST_SORT_FIELDS, Post, PostView},
    },
    utils::{
        html::clean_html,
        jwt::{Claims, maybe_viewer},
    },
};

/// One page of posts, globally or scoped to a blog, with reaction
/// aggregates resolved in bulk. Items and total count evaluate the same
/// predicate within the request.
pub(crate) async fn fetch_posts_page(
    pool: &PgPool,
    blog_id: Option<Uuid>,
    params: &PageQuery,
    viewer_id: Option<Uuid>,
) -> Result<Page<PostView>, AppError> {
    let sort = params.sort_column(POST_SORT_FIELDS);
    let direction = params.direction();

    // id ASC tie-break keeps pagination deterministic when the sort field
    // has duplicate values.
    let sql = format!(
        "SELECT id, title, short_description, content, blog_id, blog_name, created_at
         FROM posts
         WHERE deletion_status = 'active' AND ($1::UUID IS NULL OR blog_id = $1)
         ORDER BY {sort} {direction}, id ASC
         LIMIT $2 OFFSET $3"
    );
    let posts = sqlx::query_as::<_, Post>(&sql)
        .bind(blog_id)
        .bind(params.size())
        .bind(params.offset())
        .fetch_all(pool)
        .await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM posts
         WHERE deletion_status = 'active' AND ($1::UUID IS NULL OR blog_id = $1)",
    )
    .bind(blog_id)
    .fetch_one(pool)
    .await?;

    let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
    let mut infos = likes::extended_likes_info_for(pool, &ids, viewer_id).await?;

    let items = posts
        .into_iter()
        .map(|post| {
            let info = infos
                .remove(&post.id)
                .unwrap_or_else(ExtendedLikesInfo::none);
            PostView::from_row(post, info)
        })
        .collect();

    Ok(Page::new(items, total_count, params))
}

pub(crate) async fn find_active_post(pool: &PgPool, id: Uuid) -> Result<Post, AppError> {
    sqlx::query_as::<_, Post>(
        "SELECT id, title, short_description, content, blog_id, blog_name, created_at
         FROM posts
         WHERE id = $1 AND deletion_status = 'active'",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Post not found".to_string()))
}

/// Lists all posts across blogs.
pub async fn list_posts(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    headers: HeaderMap,
    Query(params): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let viewer_id = maybe_viewer(&headers, &config.jwt_secret)
        .and_then(|claims| claims.user_id().ok());

    let page = fetch_posts_page(&pool, None, &params, viewer_id).await?;
    Ok(Json(page))
}

/// Retrieves a single post by ID, with the viewer's reaction state.
pub async fn get_post(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let post = find_active_post(&pool, id).await?;

    let viewer_id = maybe_viewer(&headers, &config.jwt_secret)
        .and_then(|claims| claims.user_id().ok());
    let info = likes::extended_likes_info(&pool, post.id, viewer_id).await?;

    Ok(Json(PostView::from_row(post, info)))
}

/// Creates a post; the target blog comes in the body.
/// Admin only.
pub async fn create_post(
    State(pool): State<PgPool>,
    Json(payload): Json<CreatePostByBlogIdRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let blog = find_active_blog(&pool, payload.blog_id).await?;

    let post = sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (title, short_description, content, blog_id, blog_name)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, title, short_description, content, blog_id, blog_name, created_at
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.short_description)
    .bind(clean_html(&payload.content))
    .bind(blog.id)
    .bind(&blog.name)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create post: {:?}", e);
        AppError::from(e)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(PostView::from_row(post, ExtendedLikesInfo::none())),
    ))
}

/// Updates a post, including moving it to another blog (blog_name follows).
/// Admin only.
pub async fn update_post(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreatePostByBlogIdRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let blog = find_active_blog(&pool, payload.blog_id).await?;

    let updated = sqlx::query_scalar::<_, Uuid>(
        r#"
        UPDATE posts
        SET title = $1, short_description = $2, content = $3, blog_id = $4, blog_name = $5
        WHERE id = $6 AND deletion_status = 'active'
        RETURNING id
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.short_description)
    .bind(clean_html(&payload.content))
    .bind(blog.id)
    .bind(&blog.name)
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    if updated.is_none() {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Soft-deletes a post, its comments and both reaction sets in one
/// transaction.
/// Admin only.
pub async fn delete_post(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    find_active_post(&pool, id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM likes
         WHERE entity_type = 'Comment'
           AND entity_id IN (SELECT id FROM comments WHERE post_id = $1)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    likes::remove_entity_likes(&mut *tx, id, EntityKind::Post).await?;

    sqlx::query("UPDATE comments SET deletion_status = 'deleted' WHERE post_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE posts SET deletion_status = 'deleted' WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to delete post: {:?}", e);
        AppError::from(e)
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists the comments of one post with reaction aggregates.
/// 404 when the post is unknown or deleted.
pub async fn list_post_comments(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(params): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    find_active_post(&pool, id).await?;

    let sort = params.sort_column(COMMENT_SORT_FIELDS);
    let direction = params.direction();

    let sql = format!(
        "SELECT id, content, post_id, user_id, user_login, created_at
         FROM comments
         WHERE post_id = $1 AND deletion_status = 'active'
         ORDER BY {sort} {direction}, id ASC
         LIMIT $2 OFFSET $3"
    );
    let comments = sqlx::query_as::<_, Comment>(&sql)
        .bind(id)
        .bind(params.size())
        .bind(params.offset())
        .fetch_all(&pool)
        .await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM comments WHERE post_id = $1 AND deletion_status = 'active'",
    )
    .bind(id)
    .fetch_one(&pool)
    .await?;

    let viewer_id = maybe_viewer(&headers, &config.jwt_secret)
        .and_then(|claims| claims.user_id().ok());

    let ids: Vec<Uuid> = comments.iter().map(|c| c.id).collect();
    let mut infos = likes::likes_info_for(&pool, &ids, viewer_id).await?;

    let items = comments
        .into_iter()
        .map(|comment| {
            let info = infos.remove(&comment.id).unwrap_or_else(LikesInfo::none);
            CommentView::from_row(comment, info)
        })
        .collect();

    Ok(Json(Page::new(items, total_count, &params)))
}

/// Creates a comment on a post, denormalizing the author's login.
/// Requires login.
pub async fn create_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let post = find_active_post(&pool, id).await?;
    let user_id = claims.user_id()?;

    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (content, post_id, user_id, user_login)
        VALUES ($1, $2, $3, $4)
        RETURNING id, content, post_id, user_id, user_login, created_at
        "#,
    )
    .bind(clean_html(&payload.content))
    .bind(post.id)
    .bind(user_id)
    .bind(&claims.login)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create comment: {:?}", e);
        AppError::from(e)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(CommentView::from_row(comment, LikesInfo::none())),
    ))
}

/// Sets the caller's like status on a post.
/// Requires login.
pub async fn set_post_like_status(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetLikeStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status = LikeStatus::parse(&payload.like_status)
        .ok_or(AppError::BadRequest("Invalid like status".to_string()))?;

    let post = find_active_post(&pool, id).await?;
    let user_id = claims.user_id()?;

    likes::set_like_status(
        &pool,
        post.id,
        EntityKind::Post,
        user_id,
        &claims.login,
        status,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
