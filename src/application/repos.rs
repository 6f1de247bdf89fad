//! Repository traits describing persistence adapters.
//!
//! Each entity gets a read trait and a write trait. Implementations enforce
//! the relational invariants themselves (uniqueness, cascade, protect) so no
//! caller can leave orphaned rows behind.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::PageWindow;
use crate::domain::entities::{
    CommentListItem, CommentRecord, FollowRecord, GroupRecord, PostListItem, PostRecord,
    UserRecord,
};
use crate::domain::error::DomainError;
use crate::domain::policy::CascadeSummary;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
    #[error(transparent)]
    Rejected(#[from] DomainError),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn duplicate(constraint: impl Into<String>) -> Self {
        Self::Duplicate {
            constraint: constraint.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(i64),
    Author(i64),
    /// Posts written by anyone the given user follows.
    FollowedBy(i64),
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub text: String,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateGroupParams {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;
}

#[async_trait]
pub trait UsersWriteRepo: Send + Sync {
    async fn create_user(&self, username: &str) -> Result<UserRecord, RepoError>;

    /// Remove the user together with every post, comment and follow edge that
    /// references them.
    async fn delete_user(&self, id: i64) -> Result<CascadeSummary, RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn find_group(&self, id: i64) -> Result<Option<GroupRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError>;

    async fn count_group_posts(&self, id: i64) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait GroupsWriteRepo: Send + Sync {
    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError>;

    /// Fails with a conflict while any post references the group.
    async fn delete_group(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;

    async fn find_post_item(&self, id: i64) -> Result<Option<PostListItem>, RepoError>;

    async fn count_posts(&self, scope: PostScope) -> Result<u64, RepoError>;

    /// Newest first; ties resolve to the most recently inserted row.
    async fn list_posts(
        &self,
        scope: PostScope,
        window: &PageWindow,
    ) -> Result<Vec<PostListItem>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    async fn find_comment(&self, id: i64) -> Result<Option<CommentRecord>, RepoError>;

    /// Newest first.
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentListItem>, RepoError>;
}

#[async_trait]
pub trait CommentsWriteRepo: Send + Sync {
    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;

    async fn update_comment(&self, id: i64, text: &str) -> Result<CommentRecord, RepoError>;
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError>;

    async fn count_followers(&self, author_id: i64) -> Result<u64, RepoError>;

    async fn count_following(&self, user_id: i64) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait FollowsWriteRepo: Send + Sync {
    async fn create_follow(&self, user_id: i64, author_id: i64)
    -> Result<FollowRecord, RepoError>;

    /// Returns `RepoError::NotFound` when no such edge exists.
    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<(), RepoError>;
}
