// Authentication service - business logic layer
// Each flow is a stateless sequence of guards that fails fast on the first
// violation, with the exact client-facing message owned by that guard.

use crate::auth::{
    models::{AuthResponse, ForgotRequest, LoginRequest, ResetRequest, SignupRequest, UserResponse},
    password::PasswordService,
    repository::{NewUser, UserStore, DUPLICATE_EMAIL},
    token::TokenService,
};
use crate::email::Mailer;
use crate::error::ApiError;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Matches "first last" style names: at least two words of letters or
/// apostrophes.
pub fn full_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"([a-zA-Z']+ )+[a-zA-Z']+$").expect("valid name pattern"))
}

/// Authentication service coordinating the credential store, password
/// hasher, token codec, and outbound mail.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenService,
    mailer: Arc<dyn Mailer>,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenService, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            tokens,
            mailer,
        }
    }

    /// Register a new user. Role always starts as USER; the session token
    /// is issued over {id, role}.
    pub async fn signup(&self, request: SignupRequest) -> Result<AuthResponse, ApiError> {
        if request.name.is_empty() || !full_name_pattern().is_match(&request.name) {
            return Err(ApiError::bad_request(
                "Please provide your first and last name",
            ));
        }
        if request.email.is_empty() || !validator::validate_email(&request.email) {
            return Err(ApiError::bad_request("Please provide a valid email address"));
        }
        validate_password(&request.password, &request.password_confirm)?;

        if self.store.find_by_email(&request.email).await?.is_some() {
            return Err(ApiError::bad_request(DUPLICATE_EMAIL));
        }

        let password_hash = PasswordService::hash_password(&request.password)?;
        let user = self
            .store
            .create(NewUser {
                name: request.name,
                email: request.email,
                password_hash,
            })
            .await?;

        let token = self.tokens.sign_session(user.id, user.role)?;
        info!("New signup: {}", user.email);

        Ok(AuthResponse {
            user: UserResponse::from(&user),
            token,
        })
    }

    /// Login with email and password.
    ///
    /// "User not found" and "Wrong password" share the 401 status but keep
    /// different messages; both are preserved as-is.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ApiError> {
        let user = self
            .store
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User not found"))?;

        if !PasswordService::verify_password(&request.password, &user.password_hash) {
            return Err(ApiError::unauthorized("Wrong password"));
        }

        let token = self.tokens.sign_session(user.id, user.role)?;
        Ok(AuthResponse {
            user: UserResponse::from(&user),
            token,
        })
    }

    /// Renew a session token.
    ///
    /// The old token is decoded without verification: an expired token is
    /// still good enough to renew from, as long as it is structurally sound
    /// and its id resolves to a real user. This is how "remember me"
    /// sessions self-renew.
    pub async fn refresh(&self, token: Option<String>) -> Result<AuthResponse, ApiError> {
        let token = token.ok_or_else(|| ApiError::unauthorized("No token provided"))?;

        let claims = self
            .tokens
            .decode_unverified(&token)
            .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::unauthorized("Invalid token"))?;

        let user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User not found"))?;

        let token = self.tokens.sign_session(user.id, user.role)?;
        info!("Refreshing token for {}", user.email);

        Ok(AuthResponse {
            user: UserResponse::from(&user),
            token,
        })
    }

    /// Start a password reset: mint a reset token, persist it on the user,
    /// then send the reset email.
    ///
    /// Mail delivery is best effort: by the time it is attempted the token
    /// is already persisted, and a send failure must not fail the request.
    pub async fn forgot(&self, request: ForgotRequest) -> Result<String, ApiError> {
        if request.email.is_empty() || !validator::validate_email(&request.email) {
            return Err(ApiError::bad_request("Please provide a valid email"));
        }

        let mut user = self
            .store
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| {
                ApiError::bad_request(format!(
                    "There is no user with the email: {}",
                    request.email
                ))
            })?;

        user.reset_password_token = self.tokens.sign_reset(user.id)?;
        let user = self.store.save(&user).await?;

        if let Err(e) = self.mailer.send_reset_email(&user).await {
            warn!("Failed to send reset email to {}: {}", user.email, e);
        }

        Ok(format!(
            "A link to reset your password has been sent to: {}",
            request.email
        ))
    }

    /// Complete a password reset.
    ///
    /// The token must verify cryptographically (expired and malformed are
    /// deliberately indistinguishable to the client) and must equal the
    /// copy stored on the user, which is what makes it single-use: a
    /// successful reset clears the stored copy and invalidates every
    /// outstanding copy of the token.
    pub async fn reset(&self, request: ResetRequest) -> Result<String, ApiError> {
        validate_password(&request.password, &request.password_confirm)?;

        if request.token.is_empty() {
            return Err(ApiError::unauthorized("Invalid reset password token"));
        }
        let claims = self
            .tokens
            .verify(&request.token)
            .map_err(|_| ApiError::unauthorized("Invalid reset password token"))?;

        let id = Uuid::parse_str(&claims.sub).map_err(|_| {
            ApiError::bad_request("Reset password token corresponds to an invalid user")
        })?;
        let mut user = self.store.find_by_id(id).await?.ok_or_else(|| {
            ApiError::bad_request("Reset password token corresponds to a non existing user")
        })?;

        if user.reset_password_token != request.token {
            return Err(ApiError::unauthorized(
                "Wrong reset password token for this user",
            ));
        }

        user.password_hash = PasswordService::hash_password(&request.password)?;
        user.reset_password_token = String::new();
        let user = self.store.save(&user).await?;

        Ok(format!("Successfully changed password for: {}", user.name))
    }
}

/// Shared password guards for signup and reset.
fn validate_password(password: &str, password_confirm: &str) -> Result<(), ApiError> {
    if password.len() < 5 {
        return Err(ApiError::bad_request(
            "A password longer than 5 characters is required",
        ));
    }
    if password_confirm.is_empty() {
        return Err(ApiError::bad_request("Please confirm your password"));
    }
    if password_confirm != password {
        return Err(ApiError::bad_request("Passwords did not match"));
    }
    Ok(())
}
