use axum::{
    Json,
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
    handlers::posts::fetch_posts_page,
    models::{
        blog::{BLOG_SORT_FIELDS, Blog, BlogView, CreateBlogRequest},
        like::ExtendedLikesInfo,
        page::{Page, PageQuery},
        post::{CreatePostRequest, Post, PostView},
    },
    utils::{html::clean_html, jwt::maybe_viewer},
};

/// Point lookup shared by the blog handlers. Soft-deleted blogs read as
/// missing.
pub(crate) async fn find_active_blog(pool: &PgPool, id: Uuid) -> Result<Blog, AppError> {
    sqlx::query_as::<_, Blog>(
        "SELECT id, name, description, website_url, is_membership, created_at
         FROM blogs
         WHERE id = $1 AND deletion_status = 'active'",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Blog not found".to_string()))
}

/// Lists blogs with pagination, sorting and an optional case-insensitive
/// name filter.
pub async fn list_blogs(
    State(pool): State<PgPool>,
    Query(params): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let sort = params.sort_column(BLOG_SORT_FIELDS);
    let direction = params.direction();
    let pattern = params.search_name_term.as_ref().map(|t| format!("%{}%", t));

    let sql = format!(
        "SELECT id, name, description, website_url, is_membership, created_at
         FROM blogs
         WHERE deletion_status = 'active' AND ($1::TEXT IS NULL OR name ILIKE $1)
         ORDER BY {sort} {direction}, id ASC
         LIMIT $2 OFFSET $3"
    );
    let blogs = sqlx::query_as::<_, Blog>(&sql)
        .bind(&pattern)
        .bind(params.size())
        .bind(params.offset())
        .fetch_all(&pool)
        .await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM blogs
         WHERE deletion_status = 'active' AND ($1::TEXT IS NULL OR name ILIKE $1)",
    )
    .bind(&pattern)
    .fetch_one(&pool)
    .await?;

    let items = blogs.into_iter().map(BlogView::from_row).collect();
    Ok(Json(Page::new(items, total_count, &params)))
}

/// Retrieves a single blog by ID.
pub async fn get_blog(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let blog = find_active_blog(&pool, id).await?;
    Ok(Json(BlogView::from_row(blog)))
}

/// Lists the posts of one blog. 404 when the blog is unknown or deleted;
/// a blog without posts yields an empty page.
pub async fn list_blog_posts(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(params): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    find_active_blog(&pool, id).await?;

    let viewer_id = maybe_viewer(&headers, &config.jwt_secret)
        .and_then(|claims| claims.user_id().ok());

    let page = fetch_posts_page(&pool, Some(id), &params, viewer_id).await?;
    Ok(Json(page))
}

/// Creates a new blog.
/// Admin only.
pub async fn create_blog(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let blog = sqlx::query_as::<_, Blog>(
        r#"
        INSERT INTO blogs (name, description, website_url)
        VALUES ($1, $2, $3)
        RETURNING id, name, description, website_url, is_membership, created_at
        "#,
    )
    .bind(&payload.name)
    .bind(clean_html(&payload.description))
    .bind(&payload.website_url)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create blog: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(BlogView::from_row(blog))))
}

/// Updates a blog's name, description and website URL.
/// Admin only.
pub async fn update_blog(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let updated = sqlx::query_scalar::<_, Uuid>(
        r#"
        UPDATE blogs
        SET name = $1, description = $2, website_url = $3
        WHERE id = $4 AND deletion_status = 'active'
        RETURNING id
        "#,
    )
    .bind(&payload.name)
    .bind(clean_html(&payload.description))
    .bind(&payload.website_url)
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    if updated.is_none() {
        return Err(AppError::NotFound("Blog not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Soft-deletes a blog and everything under it: its posts, their comments,
/// and the reaction rows of both. One transaction.
/// Admin only.
pub async fn delete_blog(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    find_active_blog(&pool, id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM likes
         WHERE entity_type = 'Comment'
           AND entity_id IN (
               SELECT c.id FROM comments c
               JOIN posts p ON c.post_id = p.id
               WHERE p.blog_id = $1
           )",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "DELETE FROM likes
         WHERE entity_type = 'Post'
           AND entity_id IN (SELECT id FROM posts WHERE blog_id = $1)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE comments SET deletion_status = 'deleted'
         WHERE post_id IN (SELECT id FROM posts WHERE blog_id = $1)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE posts SET deletion_status = 'deleted' WHERE blog_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE blogs SET deletion_status = 'deleted' WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to delete blog: {:?}", e);
        AppError::from(e)
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Creates a post under a blog, denormalizing the blog name into the row.
/// Admin only.
pub async fn create_blog_post(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let blog = find_active_blog(&pool, id).await?;

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
