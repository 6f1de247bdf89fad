//! Paginated post listings: the main index, group pages, author profiles and
//! the follow feed.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::application::error::ContentError;
use crate::application::pagination::{Page, PageNumber, Paginator};
use crate::application::repos::{FollowsRepo, GroupsRepo, PostScope, PostsRepo, UsersRepo};
use crate::cache::PageCache;
use crate::domain::entities::{GroupRecord, PostListItem, UserRecord};

pub type PostPage = Page<PostListItem>;

#[derive(Debug, Clone, Serialize)]
pub struct GroupPage {
    pub group: GroupRecord,
    pub page: PostPage,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub author: UserRecord,
    pub posts: PostPage,
    pub post_count: u64,
    /// Whether the viewing user follows `author`; false for anonymous viewers.
    pub following: bool,
    pub followers: u64,
    pub following_count: u64,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
    paginator: Paginator,
    index_cache: Arc<PageCache<PostPage>>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
        follows: Arc<dyn FollowsRepo>,
        paginator: Paginator,
        index_cache: Arc<PageCache<PostPage>>,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            follows,
            paginator,
            index_cache,
        }
    }

    pub fn index_cache(&self) -> &PageCache<PostPage> {
        &self.index_cache
    }

    /// Main listing as served to visitors; may be up to one cache TTL stale.
    pub async fn index(&self, page: PageNumber) -> Result<PostPage, ContentError> {
        let key = format!("index?page={}", page.get());
        if let Some(cached) = self.index_cache.get(&key) {
            return Ok(cached);
        }

        let fresh = self.list_all_posts(page).await?;
        self.index_cache.insert(key, fresh.clone());
        Ok(fresh)
    }

    /// Uncached listing of every post.
    pub async fn list_all_posts(&self, page: PageNumber) -> Result<PostPage, ContentError> {
        self.list_scope(PostScope::All, page).await
    }

    pub async fn list_posts_by_group(
        &self,
        slug: &str,
        page: PageNumber,
    ) -> Result<GroupPage, ContentError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| ContentError::not_found("group"))?;

        let page = self.list_scope(PostScope::Group(group.id), page).await?;
        Ok(GroupPage { group, page })
    }

    pub async fn list_posts_by_author(
        &self,
        username: &str,
        page: PageNumber,
    ) -> Result<PostPage, ContentError> {
        let author = self.author(username).await?;
        self.list_scope(PostScope::Author(author.id), page).await
    }

    /// Posts by everyone `user_id` follows.
    pub async fn list_followed_posts(
        &self,
        user_id: i64,
        page: PageNumber,
    ) -> Result<PostPage, ContentError> {
        if self.users.find_user(user_id).await?.is_none() {
            return Err(ContentError::not_found("user"));
        }
        self.list_scope(PostScope::FollowedBy(user_id), page).await
    }

    pub async fn profile(
        &self,
        username: &str,
        viewer: Option<i64>,
        page: PageNumber,
    ) -> Result<Profile, ContentError> {
        let author = self.author(username).await?;
        let posts = self.list_scope(PostScope::Author(author.id), page).await?;

        let following = match viewer {
            Some(viewer_id) if viewer_id != author.id => {
                self.follows.is_following(viewer_id, author.id).await?
            }
            _ => false,
        };
        let followers = self.follows.count_followers(author.id).await?;
        let following_count = self.follows.count_following(author.id).await?;

        Ok(Profile {
            post_count: posts.total,
            author,
            posts,
            following,
            followers,
            following_count,
        })
    }

    async fn author(&self, username: &str) -> Result<UserRecord, ContentError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| ContentError::not_found("user"))
    }

    async fn list_scope(
        &self,
        scope: PostScope,
        page: PageNumber,
    ) -> Result<PostPage, ContentError> {
        let total = self.posts.count_posts(scope).await?;
        let window = self.paginator.locate(total, page);
        let items = if window.limit == 0 {
            Vec::new()
        } else {
            self.posts.list_posts(scope, &window).await?
        };

        debug!(
            target = "application::feed::list_scope",
            scope = ?scope,
            page = window.number,
            num_pages = window.num_pages,
            items = items.len(),
            "post page loaded"
        );
        Ok(Page::from_window(items, window))
    }
}
