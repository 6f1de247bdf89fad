//! In-process content store.
//!
//! Implements every repository trait over plain maps guarded by one
//! `tokio::sync::RwLock`. Uniqueness, foreign keys and the deletion policies
//! behave exactly as the Postgres schema does, so services can run against
//! either store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::application::pagination::PageWindow;
use crate::application::repos::{
    CommentsRepo, CommentsWriteRepo, CreateCommentParams, CreateGroupParams, CreatePostParams,
    FollowsRepo, FollowsWriteRepo, GroupsRepo, GroupsWriteRepo, PostScope, PostsRepo,
    PostsWriteRepo, RepoError, UpdatePostParams, UsersRepo, UsersWriteRepo,
};
use crate::domain::entities::{
    CommentListItem, CommentRecord, FollowRecord, GroupRecord, GroupSummary, PostListItem,
    PostRecord, UserRecord,
};
use crate::domain::error::DomainError;
use crate::domain::policy::{
    CascadeSummary, ensure_follow_allowed, ensure_group_removable, user_cascade,
};
use crate::domain::validation::{ensure_text, validate_slug};

#[derive(Default)]
struct Sequences {
    users: i64,
    groups: i64,
    posts: i64,
    comments: i64,
    follows: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, UserRecord>,
    groups: BTreeMap<i64, GroupRecord>,
    posts: BTreeMap<i64, PostRecord>,
    comments: BTreeMap<i64, CommentRecord>,
    follows: BTreeMap<i64, FollowRecord>,
    sequences: Sequences,
    last_timestamp: Option<OffsetDateTime>,
}

impl Tables {
    /// Wall-clock time, never earlier than any timestamp handed out before.
    fn timestamp(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let stamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(stamp);
        stamp
    }

    fn require_user(&self, id: i64) -> Result<(), RepoError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(DomainError::not_found("user").into())
        }
    }

    fn require_group(&self, id: Option<i64>) -> Result<(), RepoError> {
        match id {
            Some(id) if !self.groups.contains_key(&id) => Err(DomainError::not_found("group").into()),
            _ => Ok(()),
        }
    }

    fn in_scope(&self, post: &PostRecord, scope: PostScope) -> bool {
        match scope {
            PostScope::All => true,
            PostScope::Group(group_id) => post.group_id == Some(group_id),
            PostScope::Author(author_id) => post.author_id == author_id,
            PostScope::FollowedBy(user_id) => self
                .follows
                .values()
                .any(|follow| follow.user_id == user_id && follow.author_id == post.author_id),
        }
    }

    fn list_item(&self, post: &PostRecord) -> Result<PostListItem, RepoError> {
        let author = self.users.get(&post.author_id).ok_or_else(|| RepoError::Integrity {
            message: format!("post {} references missing user {}", post.id, post.author_id),
        })?;
        let group = post
            .group_id
            .and_then(|id| self.groups.get(&id))
            .map(|group| GroupSummary {
                id: group.id,
                title: group.title.clone(),
                slug: group.slug.clone(),
            });

        Ok(PostListItem {
            post: post.clone(),
            author_username: author.username.clone(),
            group,
        })
    }
}

#[derive(Clone, Default)]
pub struct InMemoryRepositories {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first; rows sharing a timestamp fall back to descending id.
fn newest_first<T>(rows: &mut [&T], key: impl Fn(&T) -> (OffsetDateTime, i64)) {
    rows.sort_by(|a, b| key(*b).cmp(&key(*a)));
}

#[async_trait]
impl UsersRepo for InMemoryRepositories {
    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }
}

#[async_trait]
impl UsersWriteRepo for InMemoryRepositories {
    async fn create_user(&self, username: &str) -> Result<UserRecord, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|user| user.username == username) {
            return Err(RepoError::duplicate("users_username_key"));
        }

        let user = UserRecord {
            id: next(&mut tables.sequences.users),
            username: username.to_string(),
            created_at: tables.timestamp(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> Result<CascadeSummary, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(RepoError::NotFound);
        }

        let doomed = user_cascade(
            id,
            tables.posts.values(),
            tables.comments.values(),
            tables.follows.values(),
        );
        tables.comments.retain(|id, _| !doomed.comments.contains(id));
        tables.follows.retain(|id, _| !doomed.follows.contains(id));
        tables.posts.retain(|id, _| !doomed.posts.contains(id));
        tables.users.remove(&id);

        Ok(doomed.summary())
    }
}

#[async_trait]
impl GroupsRepo for InMemoryRepositories {
    async fn find_group(&self, id: i64) -> Result<Option<GroupRecord>, RepoError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .groups
            .values()
            .find(|group| group.slug == slug)
            .cloned())
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let tables = self.tables.read().await;
        let mut groups: Vec<GroupRecord> = tables.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn count_group_posts(&self, id: i64) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .values()
            .filter(|post| post.group_id == Some(id))
            .count() as u64)
    }
}

#[async_trait]
impl GroupsWriteRepo for InMemoryRepositories {
    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        validate_slug(&params.slug)?;

        let mut tables = self.tables.write().await;
        if tables.groups.values().any(|group| group.slug == params.slug) {
            return Err(RepoError::duplicate("groups_slug_key"));
        }

        let group = GroupRecord {
            id: next(&mut tables.sequences.groups),
            title: params.title,
            slug: params.slug,
            description: params.description,
        };
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn delete_group(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let slug = match tables.groups.get(&id) {
            Some(group) => group.slug.clone(),
            None => return Err(RepoError::NotFound),
        };

        let referencing = tables
            .posts
            .values()
            .filter(|post| post.group_id == Some(id))
            .count() as u64;
        ensure_group_removable(&slug, referencing)?;

        tables.groups.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl PostsRepo for InMemoryRepositories {
    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn find_post_item(&self, id: i64) -> Result<Option<PostListItem>, RepoError> {
        let tables = self.tables.read().await;
        tables
            .posts
            .get(&id)
            .map(|post| tables.list_item(post))
            .transpose()
    }

    async fn count_posts(&self, scope: PostScope) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .values()
            .filter(|post| tables.in_scope(post, scope))
            .count() as u64)
    }

    async fn list_posts(
        &self,
        scope: PostScope,
        window: &PageWindow,
    ) -> Result<Vec<PostListItem>, RepoError> {
        let tables = self.tables.read().await;
        let mut posts: Vec<&PostRecord> = tables
            .posts
            .values()
            .filter(|post| tables.in_scope(post, scope))
            .collect();
        newest_first(&mut posts, |post| (post.created_at, post.id));

        posts
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .map(|post| tables.list_item(post))
            .collect()
    }
}

#[async_trait]
impl PostsWriteRepo for InMemoryRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        ensure_text(&params.text, "post text")?;

        let mut tables = self.tables.write().await;
        tables.require_user(params.author_id)?;
        tables.require_group(params.group_id)?;

        let post = PostRecord {
            id: next(&mut tables.sequences.posts),
            text: params.text,
            author_id: params.author_id,
            group_id: params.group_id,
            image: params.image,
            created_at: tables.timestamp(),
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        ensure_text(&params.text, "post text")?;

        let mut tables = self.tables.write().await;
        tables.require_group(params.group_id)?;

        let post = tables.posts.get_mut(&params.id).ok_or(RepoError::NotFound)?;
        post.text = params.text;
        post.group_id = params.group_id;
        post.image = params.image;
        Ok(post.clone())
    }
}

#[async_trait]
impl CommentsRepo for InMemoryRepositories {
    async fn find_comment(&self, id: i64) -> Result<Option<CommentRecord>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentListItem>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<&CommentRecord> = tables
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .collect();
        newest_first(&mut comments, |comment| (comment.created_at, comment.id));

        comments
            .into_iter()
            .map(|comment| {
                let author = tables.users.get(&comment.author_id).ok_or_else(|| {
                    RepoError::Integrity {
                        message: format!(
                            "comment {} references missing user {}",
                            comment.id, comment.author_id
                        ),
                    }
                })?;
                Ok(CommentListItem {
                    comment: comment.clone(),
                    author_username: author.username.clone(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl CommentsWriteRepo for InMemoryRepositories {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        ensure_text(&params.text, "comment text")?;

        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&params.post_id) {
            return Err(DomainError::not_found("post").into());
        }
        tables.require_user(params.author_id)?;

        let comment = CommentRecord {
            id: next(&mut tables.sequences.comments),
            post_id: params.post_id,
            author_id: params.author_id,
            text: params.text,
            created_at: tables.timestamp(),
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, id: i64, text: &str) -> Result<CommentRecord, RepoError> {
        ensure_text(text, "comment text")?;

        let mut tables = self.tables.write().await;
        let comment = tables.comments.get_mut(&id).ok_or(RepoError::NotFound)?;
        comment.text = text.to_string();
        Ok(comment.clone())
    }
}

#[async_trait]
impl FollowsRepo for InMemoryRepositories {
    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .values()
            .any(|follow| follow.user_id == user_id && follow.author_id == author_id))
    }

    async fn count_followers(&self, author_id: i64) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .values()
            .filter(|follow| follow.author_id == author_id)
            .count() as u64)
    }

    async fn count_following(&self, user_id: i64) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .values()
            .filter(|follow| follow.user_id == user_id)
            .count() as u64)
    }
}

#[async_trait]
impl FollowsWriteRepo for InMemoryRepositories {
    async fn create_follow(&self, user_id: i64, author_id: i64) -> Result<FollowRecord, RepoError> {
        let mut tables = self.tables.write().await;
        let already_following = tables
            .follows
            .values()
            .any(|follow| follow.user_id == user_id && follow.author_id == author_id);
        ensure_follow_allowed(user_id, author_id, already_following)?;
        tables.require_user(user_id)?;
        tables.require_user(author_id)?;

        let follow = FollowRecord {
            id: next(&mut tables.sequences.follows),
            user_id,
            author_id,
            created_at: tables.timestamp(),
        };
        tables.follows.insert(follow.id, follow.clone());
        Ok(follow)
    }

    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let edge = tables
            .follows
            .iter()
            .find(|(_, follow)| follow.user_id == user_id && follow.author_id == author_id)
            .map(|(id, _)| *id)
            .ok_or(RepoError::NotFound)?;
        tables.follows.remove(&edge);
        Ok(())
    }
}
