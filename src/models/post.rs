use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::like::ExtendedLikesInfo;

/// sortBy allow-list for post listings. blogName is the denormalized column
/// on the posts table; COLLATE "C" keeps the ordering byte-wise.
pub const POST_SORT_FIELDS: &[(&str, &'static str)] = &[
    ("title", "title"),
    ("shortDescription", "short_description"),
    ("blogName", "blog_name COLLATE \"C\""),
    ("createdAt", "created_at"),
];

/// Represents the 'posts' table in the database.
/// blog_name is captured when the post is created and never refreshed.
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub short_description: String,
    pub content: String,
    pub blog_id: Uuid,
    pub blog_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating or updating a post under a known blog.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 30, message = "Title must be between 1 and 30 characters"))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Short description must be between 1 and 100 characters"
    ))]
    pub short_description: String,

    #[validate(length(
        min = 1,
        max = 1000,
        message = "Content must be between 1 and 1000 characters"
    ))]
    pub content: String,
}

/// DTO for the top-level POST /posts and PUT /posts/{id} routes, where the
/// target blog comes in the body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostByBlogIdRequest {
    #[validate(length(min = 1, max = 30, message = "Title must be between 1 and 30 characters"))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Short description must be between 1 and 100 characters"
    ))]
    pub short_description: String,

    #[validate(length(
        min = 1,
        max = 1000,
        message = "Content must be between 1 and 1000 characters"
    ))]
    pub content: String,

    pub blog_id: Uuid,
}

/// Externally visible post shape. Field names and nesting are a
/// compatibility surface and must not change.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub short_description: String,
    pub content: String,
    pub blog_id: Uuid,
    pub blog_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub extended_likes_info: ExtendedLikesInfo,
}

impl PostView {
    /// Pure projection: raw row + aggregated reaction state, no I/O.
    pub fn from_row(post: Post, extended_likes_info: ExtendedLikesInfo) -> Self {
        Self {
            id: post.id,
            title: post.title,
            short_description: post.short_description,
            content: post.content,
            blog_id: post.blog_id,
            blog_name: post.blog_name,
            created_at: post.created_at,
            extended_likes_info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::like::{LikeDetailsView, LikeStatus};

    fn sample_post() -> Post {
        Post {
            id: Uuid::new_v4(),
            title: "title".into(),
            short_description: "short".into(),
            content: "content".into(),
            blog_id: Uuid::new_v4(),
            blog_name: "my blog".into(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn view_matches_the_wire_contract() {
        let post = sample_post();
        let liker = Uuid::new_v4();
        let info = ExtendedLikesInfo {
            likes_count: 2,
            dislikes_count: 1,
            my_status: LikeStatus::Like,
            newest_likes: vec![LikeDetailsView {
                added_at: chrono::Utc::now(),
                user_id: liker,
                login: "u1".into(),
            }],
        };

        let view = PostView::from_row(post.clone(), info);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["shortDescription"], "short");
        assert_eq!(json["blogName"], "my blog");
        assert_eq!(json["extendedLikesInfo"]["likesCount"], 2);
        assert_eq!(json["extendedLikesInfo"]["dislikesCount"], 1);
        assert_eq!(json["extendedLikesInfo"]["myStatus"], "Like");
        assert_eq!(
            json["extendedLikesInfo"]["newestLikes"][0]["login"],
            "u1"
        );
        assert_eq!(
            json["extendedLikesInfo"]["newestLikes"][0]["userId"],
            liker.to_string()
        );
    }

    #[test]
    fn anonymous_projection_has_none_status() {
        let view = PostView::from_row(sample_post(), ExtendedLikesInfo::none());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["extendedLikesInfo"]["myStatus"], "None");
        assert_eq!(json["extendedLikesInfo"]["newestLikes"], serde_json::json!([]));
    }
}
