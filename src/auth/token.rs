// Signed token codec for session and password-reset tokens

use crate::auth::models::Role;
use crate::error::ApiError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token claims. Session tokens carry the role at issuance time; reset
/// tokens only bind the principal id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub iat: i64,
    pub exp: i64,
}

/// Verification failures. Expiry stays distinguishable from a bad signature
/// so each caller can decide how much to reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

/// Token service for signing, verifying, and non-authoritative decoding
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    session_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: String, session_ttl: Duration, reset_ttl: Duration) -> Self {
        Self {
            secret,
            session_ttl,
            reset_ttl,
        }
    }

    /// Issues a session token over {id, role} with the configured TTL.
    pub fn sign_session(&self, user_id: Uuid, role: Role) -> Result<String, ApiError> {
        self.sign(user_id.to_string(), Some(role), self.session_ttl)
    }

    /// Issues a password-reset token bound to the principal id, with the
    /// shorter reset window.
    pub fn sign_reset(&self, user_id: Uuid) -> Result<String, ApiError> {
        self.sign(user_id.to_string(), None, self.reset_ttl)
    }

    /// Signs arbitrary claims with an explicit TTL.
    pub fn sign(&self, sub: String, role: Option<Role>, ttl: Duration) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub,
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Token signing failed: {}", e)))
    }

    /// Full verification: signature and expiry, with no leeway.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
    }

    /// Parses claims without checking signature or expiry.
    ///
    /// Only for non-authoritative reads: the refresh flow must accept
    /// expired-but-structurally-sound tokens so sessions can self-renew.
    /// Anything trusted goes through `verify`.
    pub fn decode_unverified(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_token_service() -> TokenService {
        TokenService::new(
            "test_secret_key_for_testing_purposes".to_string(),
            Duration::days(7),
            Duration::days(2),
        )
    }

    #[test]
    fn test_session_token_round_trip() {
        let service = test_token_service();
        let user_id = Uuid::new_v4();

        let token = service.sign_session(user_id, Role::Mentor).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, Some(Role::Mentor));
        assert_eq!(claims.exp - claims.iat, Duration::days(7).num_seconds());
    }

    #[test]
    fn test_reset_token_uses_reset_window_and_no_role() {
        let service = test_token_service();
        let user_id = Uuid::new_v4();

        let token = service.sign_reset(user_id).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, None);
        assert_eq!(claims.exp - claims.iat, Duration::days(2).num_seconds());
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let service = test_token_service();
        let other = TokenService::new("different".to_string(), Duration::days(7), Duration::days(2));

        let token = service.sign_session(Uuid::new_v4(), Role::User).unwrap();
        assert_eq!(other.verify(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_verify_distinguishes_expired_from_invalid() {
        let service = test_token_service();

        let expired = service
            .sign(Uuid::new_v4().to_string(), None, Duration::seconds(-60))
            .unwrap();
        assert_eq!(service.verify(&expired).unwrap_err(), TokenError::Expired);

        assert_eq!(
            service.verify("not.a.token").unwrap_err(),
            TokenError::Invalid
        );
        assert_eq!(service.verify("").unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_decode_unverified_accepts_expired_tokens() {
        let service = test_token_service();
        let user_id = Uuid::new_v4();

        let expired = service
            .sign(user_id.to_string(), Some(Role::User), Duration::seconds(-60))
            .unwrap();
        assert!(service.verify(&expired).is_err());

        let claims = service.decode_unverified(&expired).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[test]
    fn test_decode_unverified_still_requires_structure() {
        let service = test_token_service();
        assert!(service.decode_unverified("garbage").is_none());
        assert!(service.decode_unverified("a.b.c").is_none());
        assert!(service.decode_unverified("").is_none());
    }

    #[test]
    fn test_decode_unverified_ignores_the_signature() {
        let service = test_token_service();
        let other = TokenService::new("different".to_string(), Duration::days(7), Duration::days(2));

        let token = other.sign_session(Uuid::new_v4(), Role::User).unwrap();
        assert!(service.verify(&token).is_err());
        assert!(service.decode_unverified(&token).is_some());
    }

    proptest! {
        #[test]
        fn prop_signed_tokens_verify(ttl_secs in 60i64..86_400) {
            let service = test_token_service();
            let user_id = Uuid::new_v4();

            let token = service
                .sign(user_id.to_string(), Some(Role::User), Duration::seconds(ttl_secs))
                .unwrap();
            let claims = service.verify(&token).unwrap();

            prop_assert_eq!(claims.sub, user_id.to_string());
            prop_assert_eq!(claims.exp - claims.iat, ttl_secs);
        }

        #[test]
        fn prop_random_strings_are_rejected(junk in "[a-zA-Z0-9]{10,60}") {
            let service = test_token_service();
            prop_assert!(service.verify(&junk).is_err());
            prop_assert!(service.decode_unverified(&junk).is_none());
        }
    }
}
