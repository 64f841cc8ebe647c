// src/likes.rs
//
// Reaction ledger: one row per (entity, user), 'None' is the absence of a
// row. All aggregate lookups are batched over the ids of a page so listing
// handlers never issue per-row queries.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::like::{EntityKind, ExtendedLikesInfo, LikeDetailsView, LikeStatus, LikesInfo},
};

/// How many newest likes a post view carries.
pub const NEWEST_LIKES_LIMIT: i64 = 3;

/// Records `actor`'s stance on one entity.
///
/// Like/Dislike is a single INSERT ... ON CONFLICT upsert, so two
/// concurrent calls for the same (actor, entity) can never leave two rows;
/// the unique index on (entity_id, entity_type, user_id) backs this.
/// None deletes the row and is a no-op when there is nothing to delete.
pub async fn set_like_status(
    pool: &PgPool,
    entity_id: Uuid,
    kind: EntityKind,
    actor_id: Uuid,
    actor_login: &str,
    status: LikeStatus,
) -> Result<(), AppError> {
    match status {
        LikeStatus::None => {
            sqlx::query(
                "DELETE FROM likes WHERE entity_id = $1 AND entity_type = $2 AND user_id = $3",
            )
            .bind(entity_id)
            .bind(kind.as_str())
            .bind(actor_id)
            .execute(pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to clear like status: {:?}", e);
                AppError::from(e)
            })?;
        }
        status => {
            sqlx::query(
                r#"
                INSERT INTO likes (entity_id, entity_type, user_id, user_login, status, added_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                ON CONFLICT (entity_id, entity_type, user_id)
                DO UPDATE SET status = EXCLUDED.status, added_at = EXCLUDED.added_at
                "#,
            )
            .bind(entity_id)
            .bind(kind.as_str())
            .bind(actor_id)
            .bind(actor_login)
            .bind(status.as_str())
            .execute(pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to upsert like status: {:?}", e);
                AppError::from(e)
            })?;
        }
    }
    Ok(())
}

/// Deletes all reaction rows for one entity. Used inside the soft-delete
/// transactions; reactions have no lifecycle beyond their target.
pub async fn remove_entity_likes(
    conn: &mut sqlx::PgConnection,
    entity_id: Uuid,
    kind: EntityKind,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM likes WHERE entity_id = $1 AND entity_type = $2")
        .bind(entity_id)
        .bind(kind.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct CountRow {
    entity_id: Uuid,
    likes_count: i64,
    dislikes_count: i64,
}

/// Like/dislike totals for a set of entities, one query.
async fn counts_for(
    pool: &PgPool,
    kind: EntityKind,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, (i64, i64)>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, CountRow>(
        r#"
        SELECT entity_id,
               COUNT(*) FILTER (WHERE status = 'Like') AS likes_count,
               COUNT(*) FILTER (WHERE status = 'Dislike') AS dislikes_count
        FROM likes
        WHERE entity_type = $1 AND entity_id = ANY($2)
        GROUP BY entity_id
        "#,
    )
    .bind(kind.as_str())
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| (r.entity_id, (r.likes_count, r.dislikes_count)))
        .collect())
}

/// The viewer's own status per entity, one query. Anonymous viewers skip
/// the query entirely and read as None everywhere.
async fn viewer_statuses_for(
    pool: &PgPool,
    kind: EntityKind,
    viewer_id: Uuid,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, LikeStatus>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT entity_id, status FROM likes
         WHERE entity_type = $1 AND user_id = $2 AND entity_id = ANY($3)",
    )
    .bind(kind.as_str())
    .bind(viewer_id)
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, status)| (id, LikeStatus::parse(&status).unwrap_or(LikeStatus::None)))
        .collect())
}

#[derive(sqlx::FromRow)]
struct NewestLikeRow {
    entity_id: Uuid,
    user_id: Uuid,
    user_login: String,
    added_at: chrono::DateTime<chrono::Utc>,
}

/// The newest Like rows per post (at most NEWEST_LIKES_LIMIT each,
/// newest first), one windowed query for the whole page.
async fn newest_likes_for(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<LikeDetailsView>>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, NewestLikeRow>(
        r#"
        SELECT entity_id, user_id, user_login, added_at
        FROM (
            SELECT entity_id, user_id, user_login, added_at,
                   ROW_NUMBER() OVER (PARTITION BY entity_id ORDER BY added_at DESC) AS rank
            FROM likes
            WHERE entity_type = 'Post' AND status = 'Like' AND entity_id = ANY($1)
        ) ranked
        WHERE rank <= $2
        ORDER BY entity_id, added_at DESC
        "#,
    )
    .bind(ids)
    .bind(NEWEST_LIKES_LIMIT)
    .fetch_all(pool)
    .await?;

    let mut newest: HashMap<Uuid, Vec<LikeDetailsView>> = HashMap::new();
    for row in rows {
        newest.entry(row.entity_id).or_default().push(LikeDetailsView {
            added_at: row.added_at,
            user_id: row.user_id,
            login: row.user_login,
        });
    }
    Ok(newest)
}

/// Aggregated reaction state for a page of comments, keyed by comment id.
/// Ids without any reactions get zero counts and None.
pub async fn likes_info_for(
    pool: &PgPool,
    ids: &[Uuid],
    viewer_id: Option<Uuid>,
) -> Result<HashMap<Uuid, LikesInfo>, AppError> {
    let counts = counts_for(pool, EntityKind::Comment, ids).await?;
    let statuses = match viewer_id {
        Some(viewer) => viewer_statuses_for(pool, EntityKind::Comment, viewer, ids).await?,
        None => HashMap::new(),
    };

    Ok(ids
        .iter()
        .map(|id| {
            let (likes_count, dislikes_count) = counts.get(id).copied().unwrap_or((0, 0));
            let my_status = statuses.get(id).copied().unwrap_or(LikeStatus::None);
            (
                *id,
                LikesInfo {
                    likes_count,
                    dislikes_count,
                    my_status,
                },
            )
        })
        .collect())
}

/// Aggregated reaction state for a page of posts, keyed by post id.
pub async fn extended_likes_info_for(
    pool: &PgPool,
    ids: &[Uuid],
    viewer_id: Option<Uuid>,
) -> Result<HashMap<Uuid, ExtendedLikesInfo>, AppError> {
    let counts = counts_for(pool, EntityKind::Post, ids).await?;
    let statuses = match viewer_id {
        Some(viewer) => viewer_statuses_for(pool, EntityKind::Post, viewer, ids).await?,
        None => HashMap::new(),
    };
    let mut newest = newest_likes_for(pool, ids).await?;

    Ok(ids
        .iter()
        .map(|id| {
            let (likes_count, dislikes_count) = counts.get(id).copied().unwrap_or((0, 0));
            let my_status = statuses.get(id).copied().unwrap_or(LikeStatus::None);
            let newest_likes = newest.remove(id).unwrap_or_default();
            (
                *id,
                ExtendedLikesInfo {
                    likes_count,
                    dislikes_count,
                    my_status,
                    newest_likes,
                },
            )
        })
        .collect())
}

/// Single-comment convenience wrapper around the batch lookup.
pub async fn likes_info(
    pool: &PgPool,
    comment_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<LikesInfo, AppError> {
    let mut infos = likes_info_for(pool, &[comment_id], viewer_id).await?;
    Ok(infos.remove(&comment_id).unwrap_or_else(LikesInfo::none))
}

/// Single-post convenience wrapper around the batch lookup.
pub async fn extended_likes_info(
    pool: &PgPool,
    post_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<ExtendedLikesInfo, AppError> {
    let mut infos = extended_likes_info_for(pool, &[post_id], viewer_id).await?;
    Ok(infos.remove(&post_id).unwrap_or_else(ExtendedLikesInfo::none))
}
