// Token extraction and role-based access control for protected routes

use crate::auth::models::{Role, User};
use crate::auth::repository::UserStore;
use crate::auth::token::TokenService;
use crate::error::ApiError;
use axum::{
    async_trait,
    body::{to_bytes, Body},
    extract::FromRequestParts,
    http::{header, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::AppState;

const BODY_LIMIT: usize = 1024 * 1024;

/// Pulls the session token out of a request. Sources are tried in order and
/// the first non-empty candidate wins:
///
/// 1. `Authorization: Bearer <token>` header
/// 2. `token` field of a JSON body
/// 3. `token` header
/// 4. `token` query parameter
/// 5. `token` cookie
///
/// Clients that store tokens in browser storage can end up sending the
/// literal strings "null" or "undefined"; those count as no token at all.
pub fn extract_token(parts: &Parts, body: Option<&serde_json::Value>) -> Option<String> {
    let candidate = bearer_token(parts)
        .or_else(|| body_token(body))
        .or_else(|| header_token(parts))
        .or_else(|| query_param(parts, "token"))
        .or_else(|| cookie_value(parts, "token"))?;
    clean_token(candidate)
}

/// Buffers the request body so its `token` field can participate in
/// extraction, then hands back an equivalent request for downstream use.
/// A body over the buffering limit is rejected outright rather than passed
/// on truncated.
pub async fn read_token(
    request: Request<Body>,
) -> Result<(Request<Body>, Option<String>), ApiError> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|_| ApiError::bad_request("Request body too large"))?;
    let json: Option<serde_json::Value> = serde_json::from_slice(&bytes).ok();

    let token = extract_token(&parts, json.as_ref());
    Ok((Request::from_parts(parts, Body::from(bytes)), token))
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn body_token(body: Option<&serde_json::Value>) -> Option<String> {
    body?
        .get("token")?
        .as_str()
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn header_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("token")?
        .to_str()
        .ok()
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn query_param(parts: &Parts, name: &str) -> Option<String> {
    parts.uri.query()?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}

fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
    let cookies = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}

fn clean_token(candidate: String) -> Option<String> {
    match candidate.as_str() {
        "null" | "undefined" => None,
        _ => Some(candidate),
    }
}

/// Verifies a session token and loads the principal behind it. Every failure
/// collapses to the same login prompt so the response does not leak whether
/// the token was missing, bad, or orphaned.
pub async fn resolve_principal(
    users: &dyn UserStore,
    tokens: &TokenService,
    token: Option<String>,
) -> Result<User, ApiError> {
    let logged_out = || ApiError::unauthorized("You must be logged in!");

    let token = token.ok_or_else(logged_out)?;
    let claims = tokens.verify(&token).map_err(|_| logged_out())?;
    let id = Uuid::parse_str(&claims.sub).map_err(|_| logged_out())?;

    users.find_by_id(id).await?.ok_or_else(logged_out)
}

/// Checks a principal's role against a route's requirement. ADMIN passes
/// everything; an empty requirement means any authenticated principal.
pub fn has_permission(role: Role, required: &[Role]) -> bool {
    role == Role::Admin || required.is_empty() || required.contains(&role)
}

/// Self-or-admin ownership check for profile edits.
pub fn user_matches(user: &User, target: Uuid) -> bool {
    user.role == Role::Admin || user.id == target
}

/// Authenticated user extractor for routes open to any logged-in principal.
///
/// When a role guard already ran, the principal it resolved is reused from
/// the request extensions; otherwise the token is extracted from the request
/// head (the body is not available here).
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        if let Some(user) = parts.extensions.get::<User>() {
            return Ok(CurrentUser(user.clone()));
        }

        let token = extract_token(parts, None);
        let user = resolve_principal(state.users.as_ref(), &state.tokens, token).await?;
        Ok(CurrentUser(user))
    }
}

/// Role guard applied as a route layer.
///
/// The resolved principal is stashed in the request extensions so handlers
/// behind the guard get it without a second lookup.
#[derive(Clone)]
pub struct RequireRoles {
    state: AppState,
    roles: &'static [Role],
}

impl RequireRoles {
    pub fn new(state: AppState, roles: &'static [Role]) -> Self {
        Self { state, roles }
    }

    pub async fn handle(self, request: Request<Body>, next: Next) -> Result<Response, ApiError> {
        let endpoint = request.uri().path().to_string();

        let (mut request, token) = read_token(request).await?;
        let user = resolve_principal(self.state.users.as_ref(), &self.state.tokens, token).await?;

        if !has_permission(user.role, self.roles) {
            warn!(
                "Denied {} to {} with role {}",
                endpoint, user.email, user.role
            );
            return Err(ApiError::unauthorized("Insufficient permissions"));
        }

        debug!("Authorized {} for {}", endpoint, user.email);
        request.extensions_mut().insert(user);
        Ok(next.run(request).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::{MemoryUserStore, NewUser};
    use chrono::Duration;
    use serde_json::json;

    fn parts_from(builder: axum::http::request::Builder) -> Parts {
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    fn bare_parts() -> Parts {
        parts_from(Request::builder().uri("/"))
    }

    fn test_token_service() -> TokenService {
        TokenService::new(
            "test_secret_key_for_testing_purposes".to_string(),
            Duration::days(7),
            Duration::days(2),
        )
    }

    // ===== extract_token =====

    #[test]
    fn test_bearer_header_wins() {
        let parts = parts_from(
            Request::builder()
                .uri("/?token=from-query")
                .header(header::AUTHORIZATION, "Bearer from-header")
                .header("token", "from-token-header"),
        );
        let body = json!({"token": "from-body"});

        assert_eq!(
            extract_token(&parts, Some(&body)),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn test_body_beats_token_header_query_and_cookie() {
        let parts = parts_from(
            Request::builder()
                .uri("/?token=from-query")
                .header("token", "from-token-header")
                .header(header::COOKIE, "token=from-cookie"),
        );
        let body = json!({"token": "from-body"});

        assert_eq!(
            extract_token(&parts, Some(&body)),
            Some("from-body".to_string())
        );
    }

    #[test]
    fn test_token_header_then_query_then_cookie() {
        let parts = parts_from(
            Request::builder()
                .uri("/?token=from-query")
                .header("token", "from-token-header"),
        );
        assert_eq!(
            extract_token(&parts, None),
            Some("from-token-header".to_string())
        );

        let parts = parts_from(Request::builder().uri("/?token=from-query"));
        assert_eq!(extract_token(&parts, None), Some("from-query".to_string()));

        let parts = parts_from(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, "session=abc; token=from-cookie"),
        );
        assert_eq!(extract_token(&parts, None), Some("from-cookie".to_string()));
    }

    #[test]
    fn test_empty_candidates_fall_through_to_later_sources() {
        // An empty bearer value does not shadow the query parameter
        let parts = parts_from(
            Request::builder()
                .uri("/?token=from-query")
                .header(header::AUTHORIZATION, "Bearer "),
        );
        assert_eq!(extract_token(&parts, None), Some("from-query".to_string()));
    }

    #[test]
    fn test_storage_sentinels_count_as_absent() {
        for sentinel in ["null", "undefined"] {
            let parts = parts_from(
                Request::builder()
                    .uri("/")
                    .header(header::AUTHORIZATION, format!("Bearer {}", sentinel)),
            );
            assert_eq!(extract_token(&parts, None), None);
        }
    }

    #[test]
    fn test_sentinel_stops_the_chain() {
        // "null" is a real candidate, so the cookie never gets a look
        let parts = parts_from(
            Request::builder()
                .uri("/")
                .header(header::AUTHORIZATION, "Bearer null")
                .header(header::COOKIE, "token=from-cookie"),
        );
        assert_eq!(extract_token(&parts, None), None);
    }

    #[test]
    fn test_no_sources_is_none() {
        assert_eq!(extract_token(&bare_parts(), None), None);
        assert_eq!(extract_token(&bare_parts(), Some(&json!({}))), None);
    }

    #[tokio::test]
    async fn test_read_token_preserves_the_body() {
        let request = Request::builder()
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"token":"from-body","other":"field"}"#))
            .unwrap();

        let (request, token) = read_token(request).await.unwrap();
        assert_eq!(token, Some("from-body".to_string()));

        let bytes = to_bytes(request.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["other"], "field");
    }

    #[tokio::test]
    async fn test_read_token_rejects_oversized_bodies() {
        let request = Request::builder()
            .uri("/")
            .body(Body::from(vec![b'x'; BODY_LIMIT + 1]))
            .unwrap();

        let err = read_token(request).await.unwrap_err();
        assert_eq!(err, ApiError::bad_request("Request body too large"));
    }

    // ===== has_permission / user_matches =====

    #[test]
    fn test_admin_passes_every_check() {
        assert!(has_permission(Role::Admin, &[]));
        assert!(has_permission(Role::Admin, &[Role::Exec]));
        assert!(has_permission(Role::Admin, &[Role::User, Role::Mentor]));
    }

    #[test]
    fn test_empty_requirement_admits_any_role() {
        for role in [Role::User, Role::Mentor, Role::Exec, Role::Admin] {
            assert!(has_permission(role, &[]));
        }
    }

    #[test]
    fn test_non_admin_roles_are_exact_match() {
        assert!(has_permission(Role::Exec, &[Role::Exec]));
        assert!(!has_permission(Role::User, &[Role::Exec]));
        assert!(!has_permission(Role::Mentor, &[Role::Exec]));
        // No hierarchy: EXEC does not imply MENTOR
        assert!(!has_permission(Role::Exec, &[Role::Mentor]));
        assert!(has_permission(Role::Mentor, &[Role::Mentor, Role::Exec]));
    }

    #[test]
    fn test_user_matches_self_or_admin() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Jane Hacker".to_string(),
            email: "a@x.com".to_string(),
            password_hash: String::new(),
            role: Role::User,
            checked_in: false,
            reset_password_token: String::new(),
            created_at: chrono::Utc::now(),
        };

        assert!(user_matches(&user, user.id));
        assert!(!user_matches(&user, Uuid::new_v4()));

        let admin = User {
            role: Role::Admin,
            ..user.clone()
        };
        assert!(user_matches(&admin, Uuid::new_v4()));
    }

    // ===== resolve_principal =====

    async fn seeded_store() -> (MemoryUserStore, User) {
        let store = MemoryUserStore::default();
        let user = store
            .create(NewUser {
                name: "Jane Hacker".to_string(),
                email: "a@x.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn test_resolve_principal_round_trip() {
        let (store, user) = seeded_store().await;
        let tokens = test_token_service();
        let token = tokens.sign_session(user.id, user.role).unwrap();

        let resolved = resolve_principal(&store, &tokens, Some(token)).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_resolve_principal_failures_share_one_message() {
        let (store, user) = seeded_store().await;
        let tokens = test_token_service();
        let logged_out = ApiError::unauthorized("You must be logged in!");

        // Missing token
        let err = resolve_principal(&store, &tokens, None).await.unwrap_err();
        assert_eq!(err, logged_out);

        // Garbage token
        let err = resolve_principal(&store, &tokens, Some("junk".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, logged_out);

        // Expired token fails here even though refresh would accept it
        let expired = tokens
            .sign(user.id.to_string(), Some(user.role), Duration::seconds(-60))
            .unwrap();
        let err = resolve_principal(&store, &tokens, Some(expired))
            .await
            .unwrap_err();
        assert_eq!(err, logged_out);

        // Valid token for a deleted principal
        let orphan = tokens.sign_session(Uuid::new_v4(), Role::User).unwrap();
        let err = resolve_principal(&store, &tokens, Some(orphan))
            .await
            .unwrap_err();
        assert_eq!(err, logged_out);
    }
}
