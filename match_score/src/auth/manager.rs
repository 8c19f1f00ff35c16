//! User account manager.

use log::info;
use std::sync::Arc;

use super::models::{Role, User, UserId};
use crate::context::EngineContext;
use crate::db::Repository;
use crate::error::{CoreError, CoreResult, require};
use crate::validation::{first_failure, non_empty};

/// User account manager
#[derive(Clone)]
pub struct UserManager {
    ctx: Arc<EngineContext>,
}

impl UserManager {
    /// Create a new user manager
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Create an account with the given role
    ///
    /// # Arguments
    ///
    /// * `email` - Contact address, unique ignoring case
    /// * `role` - Initial role
    ///
    /// # Returns
    ///
    /// * `CoreResult<User>` - The stored user
    pub async fn create_user(&self, email: &str, role: Role) -> CoreResult<User> {
        let mut uow = self.ctx.store.begin().await?;
        let result = create_user_in(&mut *uow, email, role).await;
        let user = self.ctx.finish(uow, result).await?;

        info!("Created {} account {}", user.role, user.id);
        Ok(user)
    }

    /// Get a user by ID
    pub async fn get_user(&self, user_id: UserId) -> CoreResult<User> {
        let mut uow = self.ctx.store.begin().await?;
        let result = uow.find_user(user_id).await;
        let found = self.ctx.finish(uow, result).await?;
        require(found, "User")
    }
}

async fn create_user_in<R: Repository + ?Sized>(
    repo: &mut R,
    email: &str,
    role: Role,
) -> CoreResult<User> {
    let email = email.trim();
    first_failure([non_empty("Email", email), valid_email(email)])?;

    let user = User::new(email, role);
    repo.insert_user(&user).await?;
    Ok(user)
}

fn valid_email(email: &str) -> CoreResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(CoreError::validation(format!(
            "'{email}' is not a valid email address"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::notify::LogNotifier;
    use crate::settings::CompetitionSettings;

    fn manager() -> UserManager {
        UserManager::new(Arc::new(EngineContext::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LogNotifier),
            CompetitionSettings::default(),
        )))
    }

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let users = manager();
        let user = users
            .create_user("director@example.com", Role::Director)
            .await
            .unwrap();

        let fetched = users.get_user(user.id).await.unwrap();
        assert_eq!(fetched, user);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let users = manager();
        users.create_user("a@example.com", Role::User).await.unwrap();

        let err = users
            .create_user("A@example.com", Role::User)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_rejects_malformed_email() {
        let users = manager();
        for email in ["", "no-at-sign", "@example.com", "user@localhost"] {
            assert!(matches!(
                users.create_user(email, Role::User).await,
                Err(CoreError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_unknown_user_not_found() {
        let users = manager();
        assert!(matches!(
            users.get_user(uuid::Uuid::new_v4()).await,
            Err(CoreError::NotFound("User"))
        ));
    }
}
