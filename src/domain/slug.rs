//! Utilities for deriving human-friendly group slugs.
//!
//! `slug::slugify` transliterates non-Latin scripts (so Cyrillic titles such
//! as "Тестовое имя" still produce an ASCII slug). Uniqueness is checked by a
//! caller-supplied predicate so slug generation stays pure.

use std::future::Future;

use slug::slugify;
use thiserror::Error;

use crate::domain::validation::GROUP_SLUG_MAX_CHARS;

const MAX_SUFFIX_ATTEMPTS: usize = 32;

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Errors that can occur while generating a slug via an async uniqueness check.
#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Derive a base slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let mut candidate = slugify(input);
    // Leave room for a `-NN` suffix.
    let limit = GROUP_SLUG_MAX_CHARS - 4;
    if candidate.len() > limit {
        candidate.truncate(limit);
        while candidate.ends_with('-') {
            candidate.pop();
        }
    }

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Produce a slug that does not collide, awaiting the uniqueness predicate.
///
/// `is_unique` returns `Ok(true)` when the slug is free. Collisions are retried
/// with a monotonic counter suffix (`-2`, `-3`, …).
pub async fn generate_unique_slug<F, Fut, E>(
    input: &str,
    mut is_unique: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input)?;

    if is_unique(&base).await.map_err(SlugAsyncError::Predicate)? {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_unique(&candidate)
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::validate_slug;

    #[test]
    fn derive_slug_lowercases_and_hyphenates() {
        assert_eq!(derive_slug("Rust Weekly News").unwrap(), "rust-weekly-news");
    }

    #[test]
    fn derive_slug_transliterates_cyrillic_into_valid_slug() {
        let slug = derive_slug("Тестовое имя").expect("slug");
        assert!(!slug.is_empty());
        validate_slug(&slug).expect("transliterated slug is valid");
    }

    #[test]
    fn derive_slug_rejects_blank_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
        assert!(matches!(
            derive_slug("!!!"),
            Err(SlugError::Unrepresentable { .. })
        ));
    }

    #[tokio::test]
    async fn generate_unique_slug_appends_counter() {
        use std::sync::Arc;
        use tokio::sync::Mutex;

        let existing = Arc::new(Mutex::new(vec!["book-club".to_string()]));

        let slug = generate_unique_slug("Book Club", |candidate| {
            let existing = existing.clone();
            let candidate = candidate.to_string();
            async move {
                let mut guard = existing.lock().await;
                if guard.contains(&candidate) {
                    Ok::<bool, std::convert::Infallible>(false)
                } else {
                    guard.push(candidate);
                    Ok::<bool, std::convert::Infallible>(true)
                }
            }
        })
        .await
        .expect("unique slug");

        assert_eq!(slug, "book-club-2");
    }

    #[tokio::test]
    async fn generate_unique_slug_exhausts() {
        let result = generate_unique_slug("Example", |_| async {
            Ok::<bool, std::convert::Infallible>(false)
        })
        .await;
        assert!(matches!(
            result,
            Err(SlugAsyncError::Slug(SlugError::Exhausted { .. }))
        ));
    }
}
