use std::sync::Arc;

use tracing::{info, warn};

use crate::application::error::ContentError;
use crate::application::repos::{RepoError, UsersRepo, UsersWriteRepo};
use crate::domain::entities::UserRecord;
use crate::domain::policy::CascadeSummary;
use crate::domain::validation::validate_username;

/// Local references to identities owned by the external auth system.
#[derive(Clone)]
pub struct UserService {
    reader: Arc<dyn UsersRepo>,
    writer: Arc<dyn UsersWriteRepo>,
}

impl UserService {
    pub fn new(reader: Arc<dyn UsersRepo>, writer: Arc<dyn UsersWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn register(&self, username: &str) -> Result<UserRecord, ContentError> {
        let username = validate_username(username)?;

        match self.writer.create_user(&username).await {
            Ok(user) => {
                info!(
                    target = "application::users::register",
                    user_id = user.id,
                    username = %user.username,
                    "user registered"
                );
                Ok(user)
            }
            Err(RepoError::Duplicate { .. }) => Err(ContentError::conflict(format!(
                "username `{username}` is already taken"
            ))),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find(&self, id: i64) -> Result<UserRecord, ContentError> {
        self.reader
            .find_user(id)
            .await?
            .ok_or_else(|| ContentError::not_found("user"))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<UserRecord, ContentError> {
        self.reader
            .find_by_username(username)
            .await?
            .ok_or_else(|| ContentError::not_found("user"))
    }

    /// Administrative removal; everything the user authored or follows goes with them.
    pub async fn delete_user(&self, id: i64) -> Result<CascadeSummary, ContentError> {
        let user = self.find(id).await?;

        let summary = self.writer.delete_user(user.id).await.map_err(|err| {
            warn!(
                target = "application::users::delete_user",
                user_id = id,
                error = %err,
                "user removal failed"
            );
            ContentError::from(err)
        })?;

        info!(
            target = "application::users::delete_user",
            user_id = id,
            username = %user.username,
            posts = summary.posts,
            comments = summary.comments,
            follows = summary.follows,
            "user removed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryRepositories;

    fn service() -> UserService {
        let repos = Arc::new(InMemoryRepositories::new());
        UserService::new(repos.clone(), repos)
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let users = service();
        users.register("leo").await.expect("first registration");

        let err = users.register("leo").await.expect_err("duplicate");
        assert!(err.is_conflict(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn blank_username_is_rejected() {
        let err = service().register("  ").await.expect_err("blank");
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn deleting_unknown_user_is_not_found() {
        let err = service().delete_user(404).await.expect_err("missing");
        assert!(err.is_not_found());
    }
}
