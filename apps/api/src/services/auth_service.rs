//! Login, token refresh and per-request authentication.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use ventas_core::User;
use ventas_db::UserRepository;

use crate::auth::{dummy_password_hash, verify_password, JwtManager, TokenPair};
use crate::error::{ServiceError, ServiceResult};

/// Body returned by a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: User,
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    jwt: Arc<JwtManager>,
}

impl AuthService {
    pub fn new(users: UserRepository, jwt: Arc<JwtManager>) -> Self {
        AuthService { users, jwt }
    }

    /// Exchanges credentials for a token pair.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<LoginResponse> {
        let Some(user) = self.users.get_by_email(email).await? else {
            verify_password(password, dummy_password_hash());
            warn!(email = %email, "login failed: unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash) {
            warn!(user_id = %user.id, "login failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        if !user.is_active {
            warn!(user_id = %user.id, "login refused: inactive account");
            return Err(ServiceError::InactiveAccount);
        }

        self.users.record_login(user.id).await?;
        let tokens = self.jwt.generate_pair(&user)?;

        info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(LoginResponse { tokens, user })
    }

    /// Issues a new pair from a refresh token, re-reading the account.
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<TokenPair> {
        let claims = self.jwt.validate_refresh_token(refresh_token)?;
        let user = self.active_user(claims.id).await?;
        self.jwt.generate_pair(&user)
    }

    /// Resolves an access token to the active user it belongs to.
    pub async fn authenticate(&self, access_token: &str) -> ServiceResult<User> {
        let claims = self.jwt.validate_access_token(access_token)?;
        self.active_user(claims.id).await
    }

    async fn active_user(&self, id: i64) -> ServiceResult<User> {
        let user = self
            .users
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        if !user.is_active {
            warn!(user_id = %id, "token presented for inactive account");
            return Err(ServiceError::InactiveAccount);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use ventas_core::Role;
    use ventas_db::{Database, DbConfig, UserChanges};

    async fn setup() -> (Database, AuthService, Arc<JwtManager>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let jwt = Arc::new(JwtManager::new("s", "iss", "aud", 3600, 86400));
        let service = AuthService::new(db.users(), jwt.clone());

        let hash = hash_password("cambiar123").unwrap();
        db.users()
            .insert("Ana", "ana@ventas.local", &hash, Role::Vendedor)
            .await
            .unwrap();

        (db, service, jwt)
    }

    #[tokio::test]
    async fn test_login_and_authenticate() {
        let (db, service, _) = setup().await;

        let login = service.login("ANA@ventas.local", "cambiar123").await.unwrap();
        assert_eq!(login.user.email, "ana@ventas.local");

        let user = service.authenticate(&login.tokens.access_token).await.unwrap();
        assert_eq!(user.id, login.user.id);

        let stored = db.users().get_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_bad_credentials_look_the_same() {
        let (_, service, _) = setup().await;

        let wrong_password = service.login("ana@ventas.local", "nope-nope").await;
        let unknown_email = service.login("nadie@ventas.local", "cambiar123").await;

        assert!(matches!(wrong_password, Err(ServiceError::InvalidCredentials)));
        assert!(matches!(unknown_email, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_inactive_user_is_rejected() {
        let (db, service, _) = setup().await;
        let login = service.login("ana@ventas.local", "cambiar123").await.unwrap();

        db.users()
            .update(
                login.user.id,
                &UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            service.authenticate(&login.tokens.access_token).await,
            Err(ServiceError::InactiveAccount)
        ));
        assert!(matches!(
            service.refresh(&login.tokens.refresh_token).await,
            Err(ServiceError::InactiveAccount)
        ));
        assert!(matches!(
            service.login("ana@ventas.local", "cambiar123").await,
            Err(ServiceError::InactiveAccount)
        ));
    }

    #[tokio::test]
    async fn test_refresh_requires_refresh_token() {
        let (_, service, _) = setup().await;
        let login = service.login("ana@ventas.local", "cambiar123").await.unwrap();

        let pair = service.refresh(&login.tokens.refresh_token).await.unwrap();
        assert!(service.authenticate(&pair.access_token).await.is_ok());

        assert!(matches!(
            service.refresh(&login.tokens.access_token).await,
            Err(ServiceError::InvalidToken)
        ));
        assert!(matches!(
            service.authenticate(&login.tokens.refresh_token).await,
            Err(ServiceError::InvalidToken)
        ));
    }
}
