//! Profile and admin user management

use std::sync::Arc;

use kernel::id::UserId;
use kernel::principal::{CurrentUser, Role};

use crate::domain::entity::user::User;
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

pub struct GetProfileUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> GetProfileUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(&self, current: &CurrentUser) -> AuthResult<User> {
        self.user_repo
            .find_by_id(&current.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

pub struct ListUsersUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> ListUsersUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(&self) -> AuthResult<Vec<User>> {
        self.user_repo.list().await
    }
}

pub struct ChangeRoleUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> ChangeRoleUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    /// Admins cannot demote themselves, which would leave nobody able to undo it.
    pub async fn execute(&self, actor: &CurrentUser, target: UserId, role: Role) -> AuthResult<User> {
        if actor.user_id == target {
            return Err(AuthError::CannotModifySelf);
        }
        if !self.user_repo.set_role(&target, role).await? {
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(actor = %actor.user_id, user_id = %target, role = role.code(), "Role changed");

        self.user_repo
            .find_by_id(&target)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

pub struct DeleteUserUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
}

impl<U, S> DeleteUserUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>) -> Self {
        Self {
            user_repo,
            session_repo,
        }
    }

    pub async fn execute(&self, actor: &CurrentUser, target: UserId) -> AuthResult<()> {
        if actor.user_id == target {
            return Err(AuthError::CannotModifySelf);
        }

        self.session_repo.delete_all_for_user(&target, None).await?;
        if !self.user_repo.delete(&target).await? {
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(actor = %actor.user_id, user_id = %target, "User deleted");
        Ok(())
    }
}
