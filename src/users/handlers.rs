// HTTP handlers for user management: listings, profile edits, role
// assignment, and event check-in

use crate::auth::middleware::{user_matches, CurrentUser};
use crate::auth::models::{Role, UserResponse};
use crate::auth::password::PasswordService;
use crate::auth::service::full_name_pattern;
use crate::error::ApiError;
use crate::extract::Json;
use crate::response::Success;
use crate::users::models::{EmailQuery, RoleRequest, UpdateUserRequest};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

/// Results returned by the search and check-in listings
const LISTING_LIMIT: i64 = 10;

fn parse_user_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request("Invalid user ID"))
}

/// List every registered user
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Not logged in or insufficient role")
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.users.list().await?;
    let users: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    Ok(Success(users))
}

/// Fetch a single user by id
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 400, description = "Malformed id or no such user"),
        (status = 401, description = "Not logged in or insufficient role")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_user_id(&id)?;
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::bad_request("User does not exist"))?;
    Ok(Success(UserResponse::from(user)))
}

/// Update a user's profile. A user may edit themselves; ADMIN may edit
/// anyone.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Malformed id, no such user, or bad password"),
        (status = 401, description = "Not the profile owner")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_user_id(&id)?;

    if !user_matches(&principal, id) {
        return Err(ApiError::unauthorized(
            "You are unauthorized to edit this profile",
        ));
    }

    let mut user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::bad_request("User does not exist"))?;

    if let Some(name) = request.name {
        if !full_name_pattern().is_match(&name) {
            return Err(ApiError::bad_request(
                "Please provide your first and last name",
            ));
        }
        user.name = name;
    }
    if let Some(password) = request.password {
        if password.len() < 5 {
            return Err(ApiError::bad_request(
                "A password longer than 5 characters is required",
            ));
        }
        user.password_hash = PasswordService::hash_password(&password)?;
    }

    let user = state.users.save(&user).await?;
    Ok(Success(UserResponse::from(user)))
}

/// Assign a role to a user by email
#[utoipa::path(
    post,
    path = "/api/admin/role",
    tag = "admin",
    request_body = RoleRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Missing email, unknown role, or no such user"),
        (status = 401, description = "Not an admin")
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    Json(request): Json<RoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.email.is_empty() {
        return Err(ApiError::bad_request("Please provide an email"));
    }
    let role = Role::parse(&request.role).ok_or_else(|| ApiError::bad_request("Invalid Role"))?;

    let user = state
        .users
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| {
            ApiError::bad_request(format!("There is no user with email: {}", request.email))
        })?;

    let user = state
        .users
        .update_role(user.id, role)
        .await?
        .ok_or_else(|| {
            ApiError::bad_request(format!("There is no user with email: {}", request.email))
        })?;
    info!("Granted {} to {}", role, user.email);
    Ok(Success(UserResponse::from(user)))
}

/// Search users by email fragment
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    params(("email" = Option<String>, Query, description = "Email fragment")),
    responses(
        (status = 200, description = "Matching users", body = [UserResponse]),
        (status = 401, description = "Not an admin")
    )
)]
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let fragment = query.email.unwrap_or_default();
    let users = state.users.search_by_email(&fragment, LISTING_LIMIT).await?;
    let users: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    Ok(Success(users))
}

/// Check a participant in by email
#[utoipa::path(
    post,
    path = "/api/exec/checkin/{email}",
    tag = "exec",
    params(("email" = String, Path, description = "Participant email")),
    responses(
        (status = 200, description = "Checked-in user", body = UserResponse),
        (status = 400, description = "No such user"),
        (status = 401, description = "Not exec staff")
    )
)]
pub async fn checkin(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::bad_request(format!("There is no user with email: {}", email)))?;

    user.checked_in = true;
    let user = state.users.save(&user).await?;
    info!("Checked in {}", user.email);
    Ok(Success(UserResponse::from(user)))
}

/// List participants who have not checked in yet, optionally narrowed by an
/// email fragment
#[utoipa::path(
    get,
    path = "/api/exec/checkin",
    tag = "exec",
    params(("email" = Option<String>, Query, description = "Email fragment")),
    responses(
        (status = 200, description = "Users still to check in", body = [UserResponse]),
        (status = 401, description = "Not exec staff")
    )
)]
pub async fn checkin_list(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state
        .users
        .list_not_checked_in(query.email.as_deref(), LISTING_LIMIT)
        .await?;
    let users: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    Ok(Success(users))
}
