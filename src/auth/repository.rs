// User persistence behind a narrow store interface
// The auth flows only ever see the `UserStore` trait; Postgres backs it in
// production and an in-memory implementation backs the test suite.

use crate::auth::models::{Role, User};
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Message for the duplicate-email conflict, shared by the pre-check in the
/// signup flow and the store-level uniqueness backstop.
pub const DUPLICATE_EMAIL: &str = "An account already exists with that email";

/// Draft for a new principal. Role always defaults to USER at creation;
/// promoting someone is a separate admin operation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Store operations the auth core and the user-management surface consume.
///
/// Email lookups are case-insensitive; stored values keep their original
/// case. Duplicate creates fail with the conflict message, which is how a
/// race between two concurrent signups is resolved.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;

    async fn create(&self, draft: NewUser) -> Result<User, ApiError>;

    /// Persists the mutable fields of an existing user (name, credential,
    /// role, check-in flag, reset token) and returns the stored record.
    async fn save(&self, user: &User) -> Result<User, ApiError>;

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, ApiError>;

    /// All users, newest first.
    async fn list(&self) -> Result<Vec<User>, ApiError>;

    /// Users whose email contains the fragment, capped at `limit`.
    async fn search_by_email(&self, fragment: &str, limit: i64) -> Result<Vec<User>, ApiError>;

    /// Users who have not checked in yet, optionally filtered by an email
    /// fragment, capped at `limit`.
    async fn list_not_checked_in(
        &self,
        fragment: Option<&str>,
        limit: i64,
    ) -> Result<Vec<User>, ApiError>;
}

/// Postgres-backed user store
pub struct PgUserStore {
    pool: PgPool,
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, checked_in, reset_password_token, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    checked_in: bool,
    reset_password_token: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, ApiError> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| ApiError::internal(format!("Unknown role in database: {}", self.role)))?;
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role,
            checked_in: self.checked_in,
            reset_password_token: self.reset_password_token,
            created_at: self.created_at,
        })
    }
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn create(&self, draft: NewUser) -> Result<User, ApiError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, name, email, password_hash, role, checked_in, reset_password_token)
             VALUES ($1, $2, $3, $4, 'USER', FALSE, '')
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return ApiError::bad_request(DUPLICATE_EMAIL);
                }
            }
            ApiError::internal(e.to_string())
        })?;

        row.into_user()
    }

    async fn save(&self, user: &User) -> Result<User, ApiError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users
             SET name = $2,
                 password_hash = $3,
                 role = $4,
                 checked_in = $5,
                 reset_password_token = $6
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.checked_in)
        .bind(&user.reset_password_token)
        .fetch_one(&self.pool)
        .await?;

        row.into_user()
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, ApiError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, ApiError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn search_by_email(&self, fragment: &str, limit: i64) -> Result<Vec<User>, ApiError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email ILIKE $1 ORDER BY created_at DESC LIMIT $2",
            USER_COLUMNS
        ))
        .bind(format!("%{}%", fragment))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn list_not_checked_in(
        &self,
        fragment: Option<&str>,
        limit: i64,
    ) -> Result<Vec<User>, ApiError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users
             WHERE checked_in = FALSE
               AND ($1::text IS NULL OR email ILIKE '%' || $1 || '%')
             ORDER BY created_at DESC
             LIMIT $2",
            USER_COLUMNS
        ))
        .bind(fragment)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }
}

/// In-memory user store backing the test suite. Mirrors the Postgres
/// semantics: case-insensitive email lookup and duplicate-create conflicts.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryUserStore {
    users: std::sync::Mutex<Vec<User>>,
}

#[cfg(test)]
#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, draft: NewUser) -> Result<User, ApiError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&draft.email)) {
            return Err(ApiError::bad_request(DUPLICATE_EMAIL));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: draft.name,
            email: draft.email,
            password_hash: draft.password_hash,
            role: Role::User,
            checked_in: false,
            reset_password_token: String::new(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User, ApiError> {
        let mut users = self.users.lock().unwrap();
        let stored = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| ApiError::internal("save on unknown user"))?;
        *stored = user.clone();
        Ok(stored.clone())
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, ApiError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.role = role;
            u.clone()
        }))
    }

    async fn list(&self) -> Result<Vec<User>, ApiError> {
        let mut users = self.users.lock().unwrap().clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn search_by_email(&self, fragment: &str, limit: i64) -> Result<Vec<User>, ApiError> {
        let fragment = fragment.to_ascii_lowercase();
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| u.email.to_ascii_lowercase().contains(&fragment))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_not_checked_in(
        &self,
        fragment: Option<&str>,
        limit: i64,
    ) -> Result<Vec<User>, ApiError> {
        let fragment = fragment.map(|f| f.to_ascii_lowercase());
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| !u.checked_in)
            .filter(|u| match &fragment {
                Some(f) => u.email.to_ascii_lowercase().contains(f),
                None => true,
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
