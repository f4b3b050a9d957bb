//! JWT authentication module.
//!
//! Handles token generation and validation, password hashing, and the
//! request extractors that guard handlers.
//!
//! ```text
//! Authorization: Bearer <jwt>
//!        │
//!        ▼
//!  AuthUser extractor ── validate_access_token ── load user ── active?
//!        │                                                        │
//!        ▼                                                        ▼
//!  AdminUser extractor ── role == admin? ──► handler          403 inactive
//! ```

use std::sync::{Arc, OnceLock};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use ventas_core::{Role, User};

use crate::error::{ApiError, ServiceError, ServiceResult};
use crate::AppState;

// =============================================================================
// Claims
// =============================================================================

/// Kind of token; a refresh token never opens a protected route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub id: i64,

    pub email: String,

    /// Role at issue time; authorization re-reads the stored role
    pub rol: Role,

    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    pub iss: String,

    pub aud: String,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// Token pair returned by login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

// =============================================================================
// JWT Manager
// =============================================================================

/// JWT token manager.
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(
        secret: &str,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        access_lifetime_secs: i64,
        refresh_lifetime_secs: i64,
    ) -> Self {
        JwtManager {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            audience: audience.into(),
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    fn generate(&self, user: &User, token_type: TokenType, lifetime_secs: i64) -> ServiceResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime_secs);

        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            rol: user.role,
            token_type,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Internal(format!("Failed to generate token: {e}")))
    }

    /// Generate an access token.
    pub fn generate_access_token(&self, user: &User) -> ServiceResult<String> {
        self.generate(user, TokenType::Access, self.access_lifetime_secs)
    }

    /// Generate a refresh token.
    pub fn generate_refresh_token(&self, user: &User) -> ServiceResult<String> {
        self.generate(user, TokenType::Refresh, self.refresh_lifetime_secs)
    }

    pub fn generate_pair(&self, user: &User) -> ServiceResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.generate_access_token(user)?,
            refresh_token: self.generate_refresh_token(user)?,
            token_type: "Bearer",
            expires_in: self.access_lifetime_secs,
        })
    }

    /// Validate signature, expiry, issuer and audience, then decode.
    pub fn validate_token(&self, token: &str) -> ServiceResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                ServiceError::InvalidToken
            })
    }

    pub fn validate_access_token(&self, token: &str) -> ServiceResult<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::Access {
            return Err(ServiceError::InvalidToken);
        }
        Ok(claims)
    }

    pub fn validate_refresh_token(&self, token: &str) -> ServiceResult<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(ServiceError::InvalidToken);
        }
        Ok(claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored hash. An unreadable hash never matches.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// An argon2 hash of a random secret. Login verifies against it when no
/// account matches the email, so both failures run the hasher.
pub fn dummy_password_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        let secret = Uuid::new_v4().to_string();
        hash_password(&secret).unwrap_or_default()
    })
}

// =============================================================================
// Extractors
// =============================================================================

/// Any authenticated, active user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// An authenticated, active admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let user = state.auth.authenticate(token).await?;
        Ok(AuthUser(user))
    }
}

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err(ApiError::forbidden("Admin role required"));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        let now = Utc::now();
        User {
            id: 7,
            name: "Ana".into(),
            email: "ana@ventas.local".into(),
            password_hash: String::new(),
            role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn manager() -> JwtManager {
        JwtManager::new("test-secret", "ventas-api", "ventas-clients", 3600, 86400)
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = manager();
        let token = manager.generate_access_token(&user(Role::Vendedor)).unwrap();

        let claims = manager.validate_access_token(&token).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.email, "ana@ventas.local");
        assert_eq!(claims.rol, Role::Vendedor);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_token_type() {
        let manager = manager();
        let pair = manager.generate_pair(&user(Role::Admin)).unwrap();

        assert!(manager.validate_refresh_token(&pair.refresh_token).is_ok());
        assert!(manager.validate_access_token(&pair.refresh_token).is_err());
        assert!(manager.validate_refresh_token(&pair.access_token).is_err());
    }

    #[test]
    fn test_foreign_tokens_rejected() {
        let token = manager().generate_access_token(&user(Role::Admin)).unwrap();

        let other_secret = JwtManager::new("other", "ventas-api", "ventas-clients", 3600, 86400);
        let other_issuer = JwtManager::new("test-secret", "other", "ventas-clients", 3600, 86400);
        let other_audience = JwtManager::new("test-secret", "ventas-api", "other", 3600, 86400);

        assert!(other_secret.validate_token(&token).is_err());
        assert!(other_issuer.validate_token(&token).is_err());
        assert!(other_audience.validate_token(&token).is_err());
        assert!(manager().validate_token("not.a.jwt").is_err());
    }

    #[test]
    fn test_expired_token() {
        let expired = JwtManager::new("test-secret", "ventas-api", "ventas-clients", -600, 86400);
        let token = expired.generate_access_token(&user(Role::Admin)).unwrap();
        assert!(matches!(
            manager().validate_access_token(&token),
            Err(ServiceError::InvalidToken)
        ));
    }

    #[test]
    fn test_claims_wire_names() {
        let token = manager().generate_access_token(&user(Role::Admin)).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        let json = base64::Engine::decode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            payload,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["type"], "access");
        assert_eq!(value["rol"], "admin");
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("cambiar123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("cambiar123", &hash));
        assert!(!verify_password("cambiar124", &hash));
        assert!(!verify_password("cambiar123", "not-a-hash"));
    }

    #[test]
    fn test_dummy_hash_is_verifiable_and_never_matches() {
        let dummy = dummy_password_hash();
        assert!(PasswordHash::new(dummy).is_ok());
        assert!(!verify_password("cambiar123", dummy));
        assert!(!verify_password("", dummy));
        assert_eq!(dummy, dummy_password_hash());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
