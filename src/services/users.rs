//! User administration service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{UpdateUser, User, UserQuery},
    repository::Repository,
};

use super::auth::AuthService;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    auth: AuthService,
}

impl UsersService {
    pub fn new(repository: Repository, auth: AuthService) -> Self {
        Self { repository, auth }
    }

    pub async fn get_user(&self, user_id: Uuid) -> AppResult<User> {
        self.repository.users.get_by_id(user_id).await
    }

    pub async fn update_user(
        &self,
        user_id: Uuid,
        update: UpdateUser,
        actor_id: Uuid,
    ) -> AppResult<User> {
        let hashed = match update.password.as_deref() {
            Some(password) => Some(self.auth.hash_password(password)?),
            None => None,
        };

        let updated = self
            .repository
            .users
            .update(
                user_id,
                update.email.as_deref(),
                hashed.as_deref(),
                update.full_name.as_deref(),
                update.role,
                update.is_active,
            )
            .await?;
        tracing::info!(user_id = %user_id, actor_id = %actor_id, "user updated");
        Ok(updated)
    }

    pub async fn delete_user(&self, user_id: Uuid, actor_id: Uuid) -> AppResult<()> {
        let user = self.repository.users.get_by_id(user_id).await?;
        if user.is_built_in {
            return Err(AppError::Forbidden(
                "The built-in admin account cannot be deleted".to_string(),
            ));
        }
        self.repository.users.delete(user_id).await?;
        tracing::info!(user_id = %user_id, actor_id = %actor_id, "user deleted");
        Ok(())
    }

    pub async fn list_users(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.list(query).await
    }
}
