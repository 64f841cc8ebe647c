use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::like::LikesInfo;

/// sortBy allow-list for comment listings.
pub const COMMENT_SORT_FIELDS: &[(&str, &'static str)] = &[
    ("content", "content"),
    ("createdAt", "created_at"),
];

/// Represents the 'comments' table in the database.
/// user_login is captured when the comment is created and never refreshed.
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub user_login: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating or updating a comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 20,
        max = 300,
        message = "Comment must be between 20 and 300 characters"
    ))]
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentatorInfo {
    pub user_id: Uuid,
    pub user_login: String,
}

/// Externally visible comment shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub commentator_info: CommentatorInfo,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub likes_info: LikesInfo,
}

impl CommentView {
    /// Pure projection: raw row + aggregated reaction state, no I/O.
    pub fn from_row(comment: Comment, likes_info: LikesInfo) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            commentator_info: CommentatorInfo {
                user_id: comment.user_id,
                user_login: comment.user_login,
            },
            created_at: comment.created_at,
            likes_info,
        }
    }
}
