//! User models.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Maximum length of a user identifier (matches the `users.id` column).
pub const MAX_USER_ID_LEN: usize = 255;

/// Opaque user identifier supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Non-empty and at most [`MAX_USER_ID_LEN`] bytes.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.len() <= MAX_USER_ID_LEN
    }

    /// Identifiers are compared case-insensitively when deciding authorship.
    pub fn same_as(&self, other: &UserId) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// User stored in database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub is_active: bool,
}

impl User {
    /// Active and not the given author.
    pub fn is_eligible_reviewer_for(&self, author: &UserId) -> bool {
        self.is_active && !self.id.same_as(author)
    }
}

/// Member supplied when creating a team.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TeamMember {
    pub user_id: UserId,
    pub username: String,
    /// Defaults to active when omitted.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Request body for standalone user creation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub user_id: String,
    pub username: String,
}

/// Request body for toggling a user's activity.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetIsActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

/// Request body for deactivating every member of a team.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeactivateTeamRequest {
    pub team_name: String,
}

/// Query parameters carrying a user id.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserQuery {
    pub user_id: String,
}

/// User payload returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.id.to_string(),
            username: u.name,
            is_active: u.is_active,
        }
    }
}

/// Assignment counter for a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserStats {
    pub user_id: String,
    pub assigned_count: i64,
}
