//! Token verification for the upgrade handshake and admin endpoints.
//!
//! Tokens are HS256-signed JWTs issued elsewhere in the system. This module
//! only verifies them and turns their claims into an [`Identity`]; it never
//! issues tokens.

use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::domain::{Identity, UserId};
use crate::error::HubError;

/// Role required by the admin endpoints.
pub const ADMIN_ROLE: &str = "admin";

/// JWT claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: UserId,
    /// The user's role name.
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Creates a verifier for tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Checks the signature and expiry of `token` and returns its identity.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Unauthorized`] if the token is malformed,
    /// expired, or signed with a different key.
    pub fn verify(&self, token: &str) -> Result<Identity, HubError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(Identity::new(data.claims.sub, data.claims.role))
    }
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

/// Caller authenticated with an `Authorization: Bearer` token carrying
/// the `admin` role.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub Identity);

impl FromRequestParts<AppState> for AdminIdentity {
    type Rejection = HubError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| HubError::Unauthorized("missing bearer token".to_string()))?;

        let identity = state.verifier.verify(token)?;
        if !identity.has_role(ADMIN_ROLE) {
            tracing::debug!(user_id = identity.user_id, role = %identity.role, "admin access denied");
            return Err(HubError::Forbidden(ADMIN_ROLE.to_string()));
        }
        Ok(Self(identity))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

    fn token(secret: &str, user_id: UserId, role: &str, ttl_secs: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            role: role.to_string(),
            exp: now + ttl_secs,
            iat: now,
        };
        let Ok(token) = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        ) else {
            panic!("token encoding failed");
        };
        token
    }

    #[test]
    fn valid_token_yields_identity() {
        let verifier = TokenVerifier::new(SECRET);
        let Ok(identity) = verifier.verify(&token(SECRET, 42, "admin", 300)) else {
            panic!("token rejected");
        };
        assert_eq!(identity, Identity::new(42, "admin"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let verifier = TokenVerifier::new(SECRET);
        let result = verifier.verify(&token("another-secret", 1, "user", 300));
        assert!(matches!(result, Err(HubError::Unauthorized(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = TokenVerifier::new(SECRET);
        let result = verifier.verify(&token(SECRET, 1, "user", -3600));
        assert!(matches!(result, Err(HubError::Unauthorized(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        let verifier = TokenVerifier::new(SECRET);
        assert!(verifier.verify("not.a.jwt").is_err());
    }

    #[test]
    fn debug_does_not_leak_key() {
        let verifier = TokenVerifier::new(SECRET);
        assert!(!format!("{verifier:?}").contains(SECRET));
    }
}
