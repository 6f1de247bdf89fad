//! Deletion and relationship policies.
//!
//! `RELATIONS` lists what happens to children when a parent row goes away.
//! The in-memory store applies these rules directly; the Postgres schema
//! encodes the same actions as foreign-key clauses, and both stores run the
//! group and follow checks below before touching rows.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::entities::{CommentRecord, FollowRecord, PostRecord};
use crate::domain::error::DomainError;

/// What happens to a child row when the row it references is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    Protect,
}

/// A foreign-key style reference between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub child: &'static str,
    pub field: &'static str,
    pub parent: &'static str,
    pub on_delete: OnDelete,
}

pub const RELATIONS: &[Relation] = &[
    Relation {
        child: "post",
        field: "author_id",
        parent: "user",
        on_delete: OnDelete::Cascade,
    },
    Relation {
        child: "post",
        field: "group_id",
        parent: "group",
        on_delete: OnDelete::Protect,
    },
    Relation {
        child: "comment",
        field: "post_id",
        parent: "post",
        on_delete: OnDelete::Cascade,
    },
    Relation {
        child: "comment",
        field: "author_id",
        parent: "user",
        on_delete: OnDelete::Cascade,
    },
    Relation {
        child: "follow",
        field: "user_id",
        parent: "user",
        on_delete: OnDelete::Cascade,
    },
    Relation {
        child: "follow",
        field: "author_id",
        parent: "user",
        on_delete: OnDelete::Cascade,
    },
];

/// Look up the configured action for `child.field -> parent`.
pub fn on_delete(child: &str, field: &str) -> Option<OnDelete> {
    RELATIONS
        .iter()
        .find(|relation| relation.child == child && relation.field == field)
        .map(|relation| relation.on_delete)
}

/// Groups are protected while any post still references them.
pub fn ensure_group_removable(slug: &str, referencing_posts: u64) -> Result<(), DomainError> {
    if referencing_posts > 0 {
        return Err(DomainError::conflict(format!(
            "group `{slug}` is referenced by {referencing_posts} post(s)"
        )));
    }
    Ok(())
}

/// Following is a directed edge between two distinct users, recorded once.
pub fn ensure_follow_allowed(
    user_id: i64,
    author_id: i64,
    already_following: bool,
) -> Result<(), DomainError> {
    if user_id == author_id {
        return Err(DomainError::validation("users cannot follow themselves"));
    }
    if already_following {
        return Err(DomainError::conflict(format!(
            "user {user_id} already follows {author_id}"
        )));
    }
    Ok(())
}

/// Rows removed together with a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeSet {
    pub posts: BTreeSet<i64>,
    pub comments: BTreeSet<i64>,
    pub follows: BTreeSet<i64>,
}

impl CascadeSet {
    pub fn summary(&self) -> CascadeSummary {
        CascadeSummary {
            posts: self.posts.len() as u64,
            comments: self.comments.len() as u64,
            follows: self.follows.len() as u64,
        }
    }
}

/// Row counts removed by a cascading delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeSummary {
    pub posts: u64,
    pub comments: u64,
    pub follows: u64,
}

/// Compute everything that goes away with `user_id`.
///
/// Comments follow both their own author and the post they hang off, so
/// comments written by other people on the user's posts are included.
pub fn user_cascade<'a>(
    user_id: i64,
    posts: impl IntoIterator<Item = &'a PostRecord>,
    comments: impl IntoIterator<Item = &'a CommentRecord>,
    follows: impl IntoIterator<Item = &'a FollowRecord>,
) -> CascadeSet {
    let posts: BTreeSet<i64> = posts
        .into_iter()
        .filter(|post| post.author_id == user_id)
        .map(|post| post.id)
        .collect();

    let comments = comments
        .into_iter()
        .filter(|comment| comment.author_id == user_id || posts.contains(&comment.post_id))
        .map(|comment| comment.id)
        .collect();

    let follows = follows
        .into_iter()
        .filter(|follow| follow.user_id == user_id || follow.author_id == user_id)
        .map(|follow| follow.id)
        .collect();

    CascadeSet {
        posts,
        comments,
        follows,
    }
}
