// HTTP handlers for the authentication endpoints

use crate::auth::middleware::{read_token, CurrentUser};
use crate::auth::models::{
    AuthResponse, ForgotRequest, LoginRequest, ResetRequest, SignupRequest, UserResponse,
};
use crate::error::ApiError;
use crate::extract::Json;
use crate::response::Success;
use crate::AppState;
use axum::{body::Body, extract::State, http::Request};

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created, session token issued", body = AuthResponse),
        (status = 400, description = "Validation failed or email already registered")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Success<AuthResponse>, ApiError> {
    let response = state.auth.signup(request).await?;
    Ok(Success(response))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token issued", body = AuthResponse),
        (status = 401, description = "Unknown email or wrong password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Success<AuthResponse>, ApiError> {
    let response = state.auth.login(request).await?;
    Ok(Success(response))
}

/// Renew a session token
///
/// The old token may arrive through any of the usual carriers, including a
/// JSON body on this GET, and may already be expired.
#[utoipa::path(
    get,
    path = "/api/auth/refresh",
    tag = "auth",
    responses(
        (status = 200, description = "Fresh session token issued", body = AuthResponse),
        (status = 401, description = "Token missing, malformed, or orphaned")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Success<AuthResponse>, ApiError> {
    let (_, token) = read_token(request).await?;
    let response = state.auth.refresh(token).await?;
    Ok(Success(response))
}

/// Request a password-reset email
#[utoipa::path(
    post,
    path = "/api/auth/forgot",
    tag = "auth",
    request_body = ForgotRequest,
    responses(
        (status = 200, description = "Reset email sent"),
        (status = 400, description = "Invalid or unknown email")
    )
)]
pub async fn forgot(
    State(state): State<AppState>,
    Json(request): Json<ForgotRequest>,
) -> Result<Success<String>, ApiError> {
    let message = state.auth.forgot(request).await?;
    Ok(Success(message))
}

/// Complete a password reset with a token from the reset email
#[utoipa::path(
    post,
    path = "/api/auth/reset",
    tag = "auth",
    request_body = ResetRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Validation failed or token maps to no user"),
        (status = 401, description = "Token invalid, expired, or already used")
    )
)]
pub async fn reset(
    State(state): State<AppState>,
    Json(request): Json<ResetRequest>,
) -> Result<Success<String>, ApiError> {
    let message = state.auth.reset(request).await?;
    Ok(Success(message))
}

/// Return the authenticated principal
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "The current user", body = UserResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn me(CurrentUser(user): CurrentUser) -> Result<Success<UserResponse>, ApiError> {
    Ok(Success(UserResponse::from(user)))
}
