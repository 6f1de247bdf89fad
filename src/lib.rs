//! Content core for a social blogging service.
//!
//! Users publish posts, optionally inside a group, comment on them and
//! follow other authors. Listings are paginated newest first.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
