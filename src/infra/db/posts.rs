use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::pagination::PageWindow;
use crate::application::repos::{
    CreatePostParams, PostScope, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::{GroupSummary, PostListItem, PostRecord};

use super::util::convert_count;
use super::{PostgresRepositories, map_sqlx_error};

const POST_COLUMNS: &str = "id, text, author_id, group_id, image, created_at";

const POST_ITEM_SELECT: &str = "SELECT p.id, p.text, p.author_id, p.group_id, p.image, \
     p.created_at, u.username AS author_username, g.title AS group_title, \
     g.slug AS group_slug \
     FROM posts p \
     INNER JOIN users u ON u.id = p.author_id \
     LEFT JOIN groups g ON g.id = p.group_id \
     WHERE 1=1 ";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    text: String,
    author_id: i64,
    group_id: Option<i64>,
    image: Option<String>,
    created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            author_id: row.author_id,
            group_id: row.group_id,
            image: row.image,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostItemRow {
    id: i64,
    text: String,
    author_id: i64,
    group_id: Option<i64>,
    image: Option<String>,
    created_at: OffsetDateTime,
    author_username: String,
    group_title: Option<String>,
    group_slug: Option<String>,
}

impl From<PostItemRow> for PostListItem {
    fn from(row: PostItemRow) -> Self {
        let group = match (row.group_id, row.group_title, row.group_slug) {
            (Some(id), Some(title), Some(slug)) => Some(GroupSummary { id, title, slug }),
            _ => None,
        };

        Self {
            post: PostRecord {
                id: row.id,
                text: row.text,
                author_id: row.author_id,
                group_id: row.group_id,
                image: row.image,
                created_at: row.created_at,
            },
            author_username: row.author_username,
            group,
        }
    }
}

impl PostgresRepositories {
    fn apply_post_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: PostScope) {
        match scope {
            PostScope::All => {}
            PostScope::Group(group_id) => {
                qb.push(" AND p.group_id = ");
                qb.push_bind(group_id);
            }
            PostScope::Author(author_id) => {
                qb.push(" AND p.author_id = ");
                qb.push_bind(author_id);
            }
            PostScope::FollowedBy(user_id) => {
                qb.push(
                    " AND EXISTS (SELECT 1 FROM follows f WHERE f.author_id = p.author_id AND f.user_id = ",
                );
                qb.push_bind(user_id);
                qb.push(")");
            }
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn find_post_item(&self, id: i64) -> Result<Option<PostListItem>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(POST_ITEM_SELECT);
        qb.push(" AND p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<PostItemRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostListItem::from))
    }

    async fn count_posts(&self, scope: PostScope) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p WHERE 1=1 ");
        Self::apply_post_scope(&mut qb, scope);

        let count: i64 = qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }

    async fn list_posts(
        &self,
        scope: PostScope,
        window: &PageWindow,
    ) -> Result<Vec<PostListItem>, RepoError> {
        let limit = i64::try_from(window.limit)
            .map_err(|_| RepoError::invalid_input("page limit out of range"))?;
        let offset = i64::try_from(window.offset)
            .map_err(|_| RepoError::invalid_input("page offset out of range"))?;

        let mut qb = QueryBuilder::<Postgres>::new(POST_ITEM_SELECT);
        Self::apply_post_scope(&mut qb, scope);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<PostItemRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostListItem::from).collect())
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "INSERT INTO posts (text, author_id, group_id, image) \
             VALUES ($1, $2, $3, $4) RETURNING {POST_COLUMNS}"
        ))
        .bind(&params.text)
        .bind(params.author_id)
        .bind(params.group_id)
        .bind(params.image.as_deref())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "UPDATE posts SET text = $2, group_id = $3, image = $4 \
             WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(params.id)
        .bind(&params.text)
        .bind(params.group_id)
        .bind(params.image.as_deref())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }
}
