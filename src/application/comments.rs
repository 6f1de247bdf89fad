use std::sync::Arc;

use tracing::{info, warn};

use crate::application::error::ContentError;
use crate::application::repos::{CommentsRepo, CommentsWriteRepo, CreateCommentParams};
use crate::domain::entities::{CommentListItem, CommentRecord};
use crate::domain::validation::ensure_text;

#[derive(Clone)]
pub struct CommentService {
    reader: Arc<dyn CommentsRepo>,
    writer: Arc<dyn CommentsWriteRepo>,
}

impl CommentService {
    pub fn new(reader: Arc<dyn CommentsRepo>, writer: Arc<dyn CommentsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn add_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<CommentRecord, ContentError> {
        ensure_text(text, "comment text")?;

        let comment = self
            .writer
            .create_comment(CreateCommentParams {
                post_id,
                author_id,
                text: text.to_string(),
            })
            .await?;

        info!(
            target = "application::comments::add_comment",
            comment_id = comment.id,
            post_id,
            author_id,
            "comment added"
        );
        Ok(comment)
    }

    pub async fn edit_comment(
        &self,
        actor_id: i64,
        comment_id: i64,
        text: &str,
    ) -> Result<CommentRecord, ContentError> {
        let existing = self
            .reader
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| ContentError::not_found("comment"))?;

        if existing.author_id != actor_id {
            warn!(
                target = "application::comments::edit_comment",
                comment_id,
                actor_id,
                "edit by non-author rejected"
            );
            return Err(ContentError::forbidden("comment"));
        }

        ensure_text(text, "comment text")?;
        let comment = self.writer.update_comment(comment_id, text).await?;
        info!(
            target = "application::comments::edit_comment",
            comment_id,
            "comment updated"
        );
        Ok(comment)
    }

    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentListItem>, ContentError> {
        self.reader
            .list_for_post(post_id)
            .await
            .map_err(ContentError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::{CreatePostParams, PostsWriteRepo, UsersWriteRepo};
    use crate::infra::memory::InMemoryRepositories;

    async fn setup() -> (CommentService, i64, i64, i64) {
        let repos = Arc::new(InMemoryRepositories::new());
        let author = repos.create_user("auth").await.expect("author");
        let reader = repos.create_user("reader").await.expect("reader");
        let post = repos
            .create_post(CreatePostParams {
                text: "Тестовый пост".to_string(),
                author_id: author.id,
                group_id: None,
                image: None,
            })
            .await
            .expect("post");
        (
            CommentService::new(repos.clone(), repos),
            post.id,
            author.id,
            reader.id,
        )
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_not_found() {
        let (comments, _, _, reader) = setup().await;
        let err = comments
            .add_comment(404, reader, "hello")
            .await
            .expect_err("missing post");
        assert!(err.is_not_found(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn empty_comment_is_rejected() {
        let (comments, post, _, reader) = setup().await;
        let err = comments.add_comment(post, reader, "").await.expect_err("empty");
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn comments_list_newest_first() {
        let (comments, post, author, reader) = setup().await;
        comments.add_comment(post, reader, "first").await.expect("first");
        comments.add_comment(post, author, "second").await.expect("second");

        let listed = comments.list_for_post(post).await.expect("list");
        let texts: Vec<_> = listed.iter().map(|item| item.comment.text.as_str()).collect();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn only_the_author_may_edit() {
        let (comments, post, author, reader) = setup().await;
        let comment = comments.add_comment(post, reader, "typo").await.expect("comment");

        let err = comments
            .edit_comment(author, comment.id, "changed")
            .await
            .expect_err("non-author");
        assert!(err.is_forbidden());

        let edited = comments
            .edit_comment(reader, comment.id, "fixed")
            .await
            .expect("author edit");
        assert_eq!(edited.text, "fixed");
    }
}
