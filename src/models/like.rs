use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's stance on a single post or comment.
///
/// `None` is never stored: it is represented by the absence of a row in the
/// likes table, and setting it deletes any existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LikeStatus {
    Like,
    Dislike,
    None,
}

impl LikeStatus {
    /// Strict parse of the wire value. Unlike sort parameters, a bad
    /// likeStatus is a 400, not a silent fallback.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Like" => Some(LikeStatus::Like),
            "Dislike" => Some(LikeStatus::Dislike),
            "None" => Some(LikeStatus::None),
            _ => Option::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LikeStatus::Like => "Like",
            LikeStatus::Dislike => "Dislike",
            LikeStatus::None => "None",
        }
    }
}

/// Which table the liked entity lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Post,
    Comment,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Post => "Post",
            EntityKind::Comment => "Comment",
        }
    }
}

/// Body of PUT .../like-status. The status arrives as free text and is
/// parsed with `LikeStatus::parse` so junk maps to 400 rather than 422.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLikeStatusRequest {
    pub like_status: String,
}

/// Aggregated reaction state attached to a comment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikesInfo {
    pub likes_count: i64,
    pub dislikes_count: i64,
    pub my_status: LikeStatus,
}

impl LikesInfo {
    /// Zero counts, anonymous viewer.
    pub fn none() -> Self {
        Self {
            likes_count: 0,
            dislikes_count: 0,
            my_status: LikeStatus::None,
        }
    }
}

/// One entry of extendedLikesInfo.newestLikes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeDetailsView {
    pub added_at: chrono::DateTime<chrono::Utc>,
    pub user_id: Uuid,
    pub login: String,
}

/// Aggregated reaction state attached to a post: counts, the viewer's own
/// status and the 3 newest likes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedLikesInfo {
    pub likes_count: i64,
    pub dislikes_count: i64,
    pub my_status: LikeStatus,
    pub newest_likes: Vec<LikeDetailsView>,
}

impl ExtendedLikesInfo {
    pub fn none() -> Self {
        Self {
            likes_count: 0,
            dislikes_count: 0,
            my_status: LikeStatus::None,
            newest_likes: Vec::new(),
        }
    }
}
