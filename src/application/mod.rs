//! Application services over the content store.

pub mod comments;
pub mod error;
pub mod feed;
pub mod follows;
pub mod groups;
pub mod pagination;
pub mod posts;
pub mod repos;
pub mod users;
