use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::application::error::ContentError;
use crate::application::repos::{
    CommentsRepo, CreatePostParams, PostScope, PostsRepo, PostsWriteRepo, UpdatePostParams,
};
use crate::domain::entities::{CommentListItem, PostListItem, PostRecord};
use crate::domain::validation::ensure_text;

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    /// Reference returned by `MediaStorage::store`.
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageChange {
    #[default]
    Keep,
    Set(String),
    Clear,
}

#[derive(Debug, Clone)]
pub struct UpdatePostCommand {
    pub actor_id: i64,
    pub post_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: ImageChange,
}

/// Everything the single-post page shows.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: PostListItem,
    pub comments: Vec<CommentListItem>,
    pub author_post_count: u64,
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    comments: Arc<dyn CommentsRepo>,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        comments: Arc<dyn CommentsRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            comments,
        }
    }

    pub async fn create_post(&self, command: CreatePostCommand) -> Result<PostRecord, ContentError> {
        ensure_text(&command.text, "post text")?;

        let params = CreatePostParams {
            text: command.text,
            author_id: command.author_id,
            group_id: command.group_id,
            image: command.image,
        };

        let post = self.writer.create_post(params).await?;
        info!(
            target = "application::posts::create_post",
            post_id = post.id,
            author_id = post.author_id,
            group_id = ?post.group_id,
            "post created"
        );
        Ok(post)
    }

    pub async fn update_post(&self, command: UpdatePostCommand) -> Result<PostRecord, ContentError> {
        let existing = self.find_post(command.post_id).await?;
        if existing.author_id != command.actor_id {
            warn!(
                target = "application::posts::update_post",
                post_id = existing.id,
                actor_id = command.actor_id,
                "edit by non-author rejected"
            );
            return Err(ContentError::forbidden("post"));
        }

        ensure_text(&command.text, "post text")?;

        let image = match command.image {
            ImageChange::Keep => existing.image,
            ImageChange::Set(reference) => Some(reference),
            ImageChange::Clear => None,
        };

        let post = self
            .writer
            .update_post(UpdatePostParams {
                id: existing.id,
                text: command.text,
                group_id: command.group_id,
                image,
            })
            .await?;

        info!(
            target = "application::posts::update_post",
            post_id = post.id,
            "post updated"
        );
        Ok(post)
    }

    pub async fn find_post(&self, id: i64) -> Result<PostRecord, ContentError> {
        self.reader
            .find_post(id)
            .await?
            .ok_or_else(|| ContentError::not_found("post"))
    }

    pub async fn post_detail(&self, id: i64) -> Result<PostDetail, ContentError> {
        let post = self
            .reader
            .find_post_item(id)
            .await?
            .ok_or_else(|| ContentError::not_found("post"))?;

        let comments = self.comments.list_for_post(id).await?;
        let author_post_count = self
            .reader
            .count_posts(PostScope::Author(post.post.author_id))
            .await?;

        Ok(PostDetail {
            post,
            comments,
            author_post_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::{CommentsWriteRepo, CreateCommentParams, UsersWriteRepo};
    use crate::infra::memory::InMemoryRepositories;

    async fn setup() -> (PostService, Arc<InMemoryRepositories>, i64, i64) {
        let repos = Arc::new(InMemoryRepositories::new());
        let author = repos.create_user("auth").await.expect("author");
        let other = repos.create_user("other").await.expect("other");
        let service = PostService::new(repos.clone(), repos.clone(), repos.clone());
        (service, repos, author.id, other.id)
    }

    fn command(author_id: i64, text: &str) -> CreatePostCommand {
        CreatePostCommand {
            author_id,
            text: text.to_string(),
            group_id: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn created_post_keeps_text_verbatim() {
        let (posts, _, author, _) = setup().await;
        let post = posts
            .create_post(command(author, "  Тестовый пост  "))
            .await
            .expect("post");

        assert_eq!(post.text, "  Тестовый пост  ");
        assert_eq!(post.author_id, author);
    }

    #[tokio::test]
    async fn whitespace_only_text_is_rejected() {
        let (posts, _, author, _) = setup().await;
        let err = posts
            .create_post(command(author, " \n\t "))
            .await
            .expect_err("blank");
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn unknown_author_or_group_is_not_found() {
        let (posts, _, author, _) = setup().await;

        let err = posts.create_post(command(999, "text")).await.expect_err("author");
        assert!(err.is_not_found(), "unexpected error: {err:?}");

        let mut with_group = command(author, "text");
        with_group.group_id = Some(999);
        let err = posts.create_post(with_group).await.expect_err("group");
        assert!(err.is_not_found(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn only_the_author_may_edit() {
        let (posts, _, author, other) = setup().await;
        let post = posts.create_post(command(author, "first")).await.expect("post");

        let err = posts
            .update_post(UpdatePostCommand {
                actor_id: other,
                post_id: post.id,
                text: "hijacked".to_string(),
                group_id: None,
                image: ImageChange::Keep,
            })
            .await
            .expect_err("non-author");
        assert!(err.is_forbidden());

        let edited = posts
            .update_post(UpdatePostCommand {
                actor_id: author,
                post_id: post.id,
                text: "second".to_string(),
                group_id: None,
                image: ImageChange::Set("posts/small.gif".to_string()),
            })
            .await
            .expect("author edit");
        assert_eq!(edited.text, "second");
        assert_eq!(edited.image.as_deref(), Some("posts/small.gif"));
        assert_eq!(edited.created_at, post.created_at);
    }

    #[tokio::test]
    async fn detail_includes_comments_and_author_count() {
        let (posts, repos, author, other) = setup().await;

        let post = posts.create_post(command(author, "first")).await.expect("post");
        posts.create_post(command(author, "second")).await.expect("post");
        repos
            .create_comment(CreateCommentParams {
                post_id: post.id,
                author_id: other,
                text: "nice".to_string(),
            })
            .await
            .expect("comment");

        let detail = posts.post_detail(post.id).await.expect("detail");
        assert_eq!(detail.post.author_username, "auth");
        assert_eq!(detail.author_post_count, 2);
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.comments[0].author_username, "other");
    }
}
