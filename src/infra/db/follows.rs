use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{FollowsRepo, FollowsWriteRepo, RepoError};
use crate::domain::entities::FollowRecord;
use crate::domain::policy::ensure_follow_allowed;

use super::util::convert_count;
use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct FollowRow {
    id: i64,
    user_id: i64,
    author_id: i64,
    created_at: OffsetDateTime,
}

impl From<FollowRow> for FollowRecord {
    fn from(row: FollowRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            author_id: row.author_id,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl FollowsRepo for PostgresRepositories {
    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn count_followers(&self, author_id: i64) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }

    async fn count_following(&self, user_id: i64) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }
}

#[async_trait]
impl FollowsWriteRepo for PostgresRepositories {
    async fn create_follow(&self, user_id: i64, author_id: i64) -> Result<FollowRecord, RepoError> {
        // Duplicates that race past this check hit `follows_user_author_key`.
        let already_following = self.is_following(user_id, author_id).await?;
        ensure_follow_allowed(user_id, author_id, already_following)?;

        let row = sqlx::query_as::<_, FollowRow>(
            r#"
            INSERT INTO follows (user_id, author_id)
            VALUES ($1, $2)
            RETURNING id, user_id, author_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
