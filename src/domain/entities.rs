//! Domain entities mirrored from persistent storage.

use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

/// Number of characters of post text used when a post is displayed inline.
pub const POST_DISPLAY_CHARS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub created_at: OffsetDateTime,
}

impl fmt::Display for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub text: String,
    pub author_id: i64,
    pub group_id: Option<i64>,
    /// Relative reference into media storage, e.g. `posts/small.gif`.
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

impl fmt::Display for PostRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.text.chars().take(POST_DISPLAY_CHARS).collect();
        f.write_str(&preview)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl fmt::Display for GroupRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created_at: OffsetDateTime,
}

impl fmt::Display for CommentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Directed subscription edge: `user_id` follows `author_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowRecord {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
    pub created_at: OffsetDateTime,
}

/// Group fields embedded in listing rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

/// A post joined with the author and group data every listing shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostListItem {
    pub post: PostRecord,
    pub author_username: String,
    pub group: Option<GroupSummary>,
}

/// A comment joined with its author's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentListItem {
    pub comment: CommentRecord,
    pub author_username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_with_text(text: &str) -> PostRecord {
        PostRecord {
            id: 1,
            text: text.to_string(),
            author_id: 1,
            group_id: None,
            image: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn post_displays_leading_characters_only() {
        let post = post_with_text("Тестовая запись длиннее пятнадцати символов");
        assert_eq!(post.to_string(), "Тестовая запись");
        assert_eq!(post.to_string().chars().count(), POST_DISPLAY_CHARS);
    }

    #[test]
    fn short_post_displays_whole_text() {
        assert_eq!(post_with_text("hello").to_string(), "hello");
    }

    #[test]
    fn group_displays_title() {
        let group = GroupRecord {
            id: 1,
            title: "Тестовое имя".into(),
            slug: "test-group".into(),
            description: "Тестовое описание".into(),
        };
        assert_eq!(group.to_string(), "Тестовое имя");
    }
}
