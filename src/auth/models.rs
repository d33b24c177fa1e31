// User model, roles, and authentication DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// User roles. ADMIN passes every role check; the other roles are
/// exact-match only, with no hierarchy between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Mentor,
    Exec,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Mentor => "MENTOR",
            Role::Exec => "EXEC",
            Role::Admin => "ADMIN",
        }
    }

    /// Parses the wire/database representation. Anything outside the closed
    /// set is rejected.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "USER" => Some(Role::User),
            "MENTOR" => Some(Role::Mentor),
            "EXEC" => Some(Role::Exec),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Principal record. The password hash and reset token never leave the
/// store boundary in a response.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub checked_in: bool,
    /// Empty string when no reset is in flight
    pub reset_password_token: String,
    pub created_at: DateTime<Utc>,
}

/// Serializable view of a user with credentials stripped
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub checked_in: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            checked_in: user.checked_in,
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse::from(&user)
    }
}

// Request DTOs use serde defaults so a missing field reaches the guard that
// owns its error message instead of failing JSON extraction.

/// Signup request DTO
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "passwordConfirm")]
    pub password_confirm: String,
}

/// Login request DTO
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Forgot-password request DTO
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ForgotRequest {
    #[serde(default)]
    pub email: String,
}

/// Reset-password request DTO
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ResetRequest {
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "passwordConfirm")]
    pub password_confirm: String,
    #[serde(default)]
    pub token: String,
}

/// Authentication response: the principal plus a fresh session token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}
