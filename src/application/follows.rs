use std::sync::Arc;

use tracing::info;

use crate::application::error::ContentError;
use crate::application::repos::{FollowsRepo, FollowsWriteRepo, RepoError, UsersRepo};
use crate::domain::entities::FollowRecord;

#[derive(Clone)]
pub struct FollowService {
    users: Arc<dyn UsersRepo>,
    reader: Arc<dyn FollowsRepo>,
    writer: Arc<dyn FollowsWriteRepo>,
}

impl FollowService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        reader: Arc<dyn FollowsRepo>,
        writer: Arc<dyn FollowsWriteRepo>,
    ) -> Self {
        Self {
            users,
            reader,
            writer,
        }
    }

    /// Subscribe `user_id` to `author_id`. Self-follows and repeats are refused.
    pub async fn follow(&self, user_id: i64, author_id: i64) -> Result<FollowRecord, ContentError> {
        let follow = self.writer.create_follow(user_id, author_id).await?;
        info!(
            target = "application::follows::follow",
            user_id,
            author_id,
            "follow created"
        );
        Ok(follow)
    }

    pub async fn follow_username(
        &self,
        user_id: i64,
        username: &str,
    ) -> Result<FollowRecord, ContentError> {
        let author_id = self.resolve(username).await?;
        self.follow(user_id, author_id).await
    }

    pub async fn unfollow(&self, user_id: i64, author_id: i64) -> Result<(), ContentError> {
        match self.writer.delete_follow(user_id, author_id).await {
            Ok(()) => {
                info!(
                    target = "application::follows::unfollow",
                    user_id,
                    author_id,
                    "follow removed"
                );
                Ok(())
            }
            Err(RepoError::NotFound) => Err(ContentError::not_found("follow")),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn unfollow_username(&self, user_id: i64, username: &str) -> Result<(), ContentError> {
        let author_id = self.resolve(username).await?;
        self.unfollow(user_id, author_id).await
    }

    pub async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool, ContentError> {
        self.reader
            .is_following(user_id, author_id)
            .await
            .map_err(ContentError::from)
    }

    async fn resolve(&self, username: &str) -> Result<i64, ContentError> {
        self.users
            .find_by_username(username)
            .await?
            .map(|user| user.id)
            .ok_or_else(|| ContentError::not_found("user"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::UsersWriteRepo;
    use crate::infra::memory::InMemoryRepositories;

    async fn setup() -> (FollowService, i64, i64) {
        let repos = Arc::new(InMemoryRepositories::new());
        let follower = repos.create_user("follower").await.expect("follower");
        let author = repos.create_user("author").await.expect("author");
        (
            FollowService::new(repos.clone(), repos.clone(), repos),
            follower.id,
            author.id,
        )
    }

    #[tokio::test]
    async fn self_follow_is_a_validation_error() {
        let (follows, follower, _) = setup().await;
        let err = follows.follow(follower, follower).await.expect_err("self");
        assert!(err.is_validation(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn repeated_follow_is_a_conflict() {
        let (follows, follower, author) = setup().await;
        follows.follow(follower, author).await.expect("first");
        let err = follows.follow(follower, author).await.expect_err("repeat");
        assert!(err.is_conflict(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn follow_and_unfollow_by_username() {
        let (follows, follower, author) = setup().await;
        follows
            .follow_username(follower, "author")
            .await
            .expect("follow");
        assert!(follows.is_following(follower, author).await.expect("query"));

        follows
            .unfollow_username(follower, "author")
            .await
            .expect("unfollow");
        assert!(!follows.is_following(follower, author).await.expect("query"));

        let err = follows
            .unfollow(follower, author)
            .await
            .expect_err("already removed");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn following_unknown_user_is_not_found() {
        let (follows, follower, _) = setup().await;
        let err = follows
            .follow_username(follower, "ghost")
            .await
            .expect_err("ghost");
        assert!(err.is_not_found());

        let err = follows.follow(follower, 999).await.expect_err("ghost id");
        assert!(err.is_not_found(), "unexpected error: {err:?}");
    }
}
