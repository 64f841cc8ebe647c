use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub password: String,
    pub role: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for registration and login.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 10, message = "Login must be between 3 and 10 characters"))]
    pub login: String,

    #[validate(length(
        min = 6,
        max = 20,
        message = "Password must be between 6 and 20 characters"
    ))]
    pub password: String,
}

/// What the API returns about a user. Never includes the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub login: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl UserView {
    pub fn from_row(user: User) -> Self {
        Self {
            id: user.id,
            login: user.login,
            created_at: user.created_at,
        }
    }
}
