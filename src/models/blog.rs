use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// sortBy allow-list for blog listings. The name sort uses COLLATE "C" so
/// ordering is byte-wise and stable across locales.
pub const BLOG_SORT_FIELDS: &[(&str, &'static str)] = &[
    ("name", "name COLLATE \"C\""),
    ("createdAt", "created_at"),
];

static WEBSITE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://([a-zA-Z0-9_-]+\.)+[a-zA-Z0-9_-]+(/[a-zA-Z0-9_-]+)*/?$").unwrap()
});

/// Represents the 'blogs' table in the database (active rows only; soft
/// deletion is filtered in every query).
#[derive(Debug, Clone, FromRow)]
pub struct Blog {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub website_url: String,
    pub is_membership: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating or fully updating a blog.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogRequest {
    #[validate(length(min = 1, max = 15, message = "Name must be between 1 and 15 characters"))]
    pub name: String,

    #[validate(length(
        min = 1,
        max = 500,
        message = "Description must be between 1 and 500 characters"
    ))]
    pub description: String,

    #[validate(
        length(max = 100, message = "Website URL must be at most 100 characters"),
        regex(path = *WEBSITE_URL_RE, message = "Website URL must be a valid https:// URL")
    )]
    pub website_url: String,
}

/// Externally visible blog shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub website_url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub is_membership: bool,
}

impl BlogView {
    pub fn from_row(blog: Blog) -> Self {
        Self {
            id: blog.id,
            name: blog.name,
            description: blog.description,
            website_url: blog.website_url,
            created_at: blog.created_at,
            is_membership: blog.is_membership,
        }
    }
}
