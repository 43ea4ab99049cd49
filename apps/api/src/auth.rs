//! Authentication: JWT access tokens, argon2 password hashes, the
//! `require_auth` middleware and the [`CurrentUser`] extractor.
//!
//! ```text
//! Authorization: Bearer <jwt>
//!        │
//!        ▼
//! require_auth ── invalid/missing ──► 401
//!        │ valid
//!        ▼
//! request.extensions ∋ Claims ──► CurrentUser in handlers
//! ```

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shopbill_core::Account;
use tracing::warn;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account id)
    pub sub: String,

    pub email: String,

    pub is_admin: bool,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &str, access_lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_lifetime_secs,
        }
    }

    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime_secs
    }

    /// Generate an access token for an account.
    pub fn issue(&self, account: &Account) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_lifetime_secs);

        let claims = Claims {
            sub: account.id.clone(),
            email: account.email.clone(),
            is_admin: account.is_admin,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate(&self, token: &str) -> ApiResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))
    }
}

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))
}

/// `Ok(false)` on a wrong password; `Err` only when the stored hash is
/// unreadable.
pub fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(format!("Invalid password hash format: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiError::Internal(format!("Password verification failed: {e}"))),
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that requires a valid access token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    let claims = state.jwt.validate(token).inspect_err(|e| {
        warn!(path = %req.uri().path(), error = %e, "Rejected request");
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// The authenticated caller, as placed in the request by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0.sub
    }

    pub fn is_admin(&self) -> bool {
        self.0.is_admin
    }

    pub fn require_admin(&self) -> ApiResult<()> {
        if self.0.is_admin {
            Ok(())
        } else {
            warn!(user = %self.0.sub, "Admin endpoint refused");
            Err(ApiError::Forbidden("admin access required".to_string()))
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthorized("not authenticated".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopbill_core::PlanStatus;

    fn account() -> Account {
        Account {
            id: "u1".to_string(),
            email: "owner@shop.in".to_string(),
            username: "owner".to_string(),
            shop_name: "Sharma Stores".to_string(),
            phone: "9800000000".to_string(),
            gst_number: None,
            address: None,
            upi_id: None,
            signature: None,
            show_customer_details: true,
            print_automatically: false,
            show_signature: true,
            referred_by: None,
            is_admin: true,
            plan_status: PlanStatus::Inactive,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret-long-enough", 3600);
        let token = manager.issue(&account()).unwrap();
        let claims = manager.validate(&token).unwrap();

        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "owner@shop.in");
        assert!(claims.is_admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtManager::new("secret-one-long-enough", 3600)
            .issue(&account())
            .unwrap();
        let result = JwtManager::new("secret-two-long-enough", 3600).validate(&token);
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("s3cretpass").unwrap();
        assert!(verify_password("s3cretpass", &hash).unwrap());
        assert!(!verify_password("wrong-pass", &hash).unwrap());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
