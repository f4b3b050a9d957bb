//! Admin management of user accounts.

use serde::Deserialize;
use tracing::info;
use ventas_core::validation::{validate_email, validate_name, validate_pagination, validate_password};
use ventas_core::{CoreError, Role, User};
use ventas_db::{UserChanges, UserRepository};

use crate::auth::hash_password;
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Vendedor
}

/// Partial update. A present `password` resets it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
}

impl UserService {
    pub fn new(users: UserRepository) -> Self {
        UserService { users }
    }

    pub async fn create(&self, input: &CreateUserRequest) -> ServiceResult<User> {
        validate_name("name", &input.name)?;
        validate_email(&input.email)?;
        validate_password(&input.password)?;

        let hash = hash_password(&input.password)?;
        let user = self
            .users
            .insert(&input.name, &input.email, &hash, input.role)
            .await?;

        info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<User> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", id).into())
    }

    pub async fn list(&self, include_inactive: bool, limit: i64, offset: i64) -> ServiceResult<Vec<User>> {
        validate_pagination(limit, offset)?;
        Ok(self.users.list(include_inactive, limit, offset).await?)
    }

    /// Applies an update on behalf of `acting`.
    pub async fn update(&self, acting: &User, id: i64, input: &UpdateUserRequest) -> ServiceResult<User> {
        if let Some(name) = &input.name {
            validate_name("name", name)?;
        }
        if let Some(email) = &input.email {
            validate_email(email)?;
        }
        if input.is_active == Some(false) && acting.id == id {
            return Err(ServiceError::Forbidden("cannot deactivate your own account".into()));
        }

        let password_hash = match &input.password {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let user = self
            .users
            .update(
                id,
                &UserChanges {
                    name: input.name.clone(),
                    email: input.email.clone(),
                    role: input.role,
                    is_active: input.is_active,
                    password_hash,
                },
            )
            .await?;

        info!(user_id = %id, by = %acting.id, "User updated");
        Ok(user)
    }

    /// Soft delete.
    pub async fn deactivate(&self, acting: &User, id: i64) -> ServiceResult<()> {
        if acting.id == id {
            return Err(ServiceError::Forbidden("cannot deactivate your own account".into()));
        }

        self.users.deactivate(id).await?;
        info!(user_id = %id, by = %acting.id, "User deactivated");
        Ok(())
    }
}
