//! Field-level input rules shared by every repository implementation.

use crate::domain::error::DomainError;

pub const USERNAME_MAX_CHARS: usize = 150;
pub const GROUP_TITLE_MAX_CHARS: usize = 200;
pub const GROUP_SLUG_MAX_CHARS: usize = 255;

/// Reject text bodies that are empty once surrounding whitespace is ignored.
///
/// The original value is kept as-is by callers; only emptiness is checked.
pub fn ensure_text(value: &str, field: &'static str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn validate_username(value: &str) -> Result<String, DomainError> {
    let username = value.trim();
    if username.is_empty() {
        return Err(DomainError::validation("username must not be empty"));
    }
    if username.chars().count() > USERNAME_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "username must be at most {USERNAME_MAX_CHARS} characters"
        )));
    }
    if let Some(ch) = username
        .chars()
        .find(|ch| !(ch.is_alphanumeric() || matches!(ch, '_' | '.' | '@' | '+' | '-')))
    {
        return Err(DomainError::validation(format!(
            "username contains unsupported character `{ch}`"
        )));
    }
    Ok(username.to_string())
}

pub fn validate_group_title(value: &str) -> Result<String, DomainError> {
    let title = value.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }
    if title.chars().count() > GROUP_TITLE_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "title must be at most {GROUP_TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

/// Slugs are ASCII letters, digits, hyphens and underscores.
pub fn validate_slug(value: &str) -> Result<String, DomainError> {
    let slug = value.trim();
    if slug.is_empty() {
        return Err(DomainError::validation("slug must not be empty"));
    }
    if slug.len() > GROUP_SLUG_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "slug must be at most {GROUP_SLUG_MAX_CHARS} characters"
        )));
    }
    if !slug
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(DomainError::validation(format!(
            "slug `{slug}` may only contain letters, numbers, hyphens and underscores"
        )));
    }
    Ok(slug.to_string())
}
