use thiserror::Error;

use crate::{application::repos::RepoError, domain::error::DomainError, infra::error::InfraError};

/// Failure of a content operation, as seen by the view layer.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("{entity} may only be changed by its author")]
    Forbidden { entity: &'static str },
    #[error(transparent)]
    Repo(RepoError),
}

impl ContentError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn forbidden(entity: &'static str) -> Self {
        Self::Forbidden { entity }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }
}

impl From<DomainError> for ContentError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::NotFound { entity } => Self::NotFound { entity },
            DomainError::Validation { message } => Self::Validation(message),
            DomainError::Conflict { message } => Self::Conflict(message),
            DomainError::Forbidden { entity } => Self::Forbidden { entity },
        }
    }
}

impl From<RepoError> for ContentError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::Rejected(domain) => domain.into(),
            RepoError::Duplicate { constraint } => {
                Self::Conflict(format!("duplicate value violates `{constraint}`"))
            }
            RepoError::NotFound => Self::NotFound { entity: "record" },
            RepoError::InvalidInput { message } => Self::Validation(message),
            other => Self::Repo(other),
        }
    }
}

/// Top-level error for the binary entry points.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_rows_surface_as_conflicts() {
        let error = ContentError::from(RepoError::duplicate("groups_slug_key"));
        assert!(error.is_conflict());
        assert!(error.to_string().contains("groups_slug_key"));
    }

    #[test]
    fn policy_rejections_keep_their_kind() {
        let protect = RepoError::Rejected(DomainError::conflict("group in use"));
        assert!(ContentError::from(protect).is_conflict());

        let self_follow = RepoError::Rejected(DomainError::validation("self"));
        assert!(ContentError::from(self_follow).is_validation());
    }

    #[test]
    fn persistence_failures_stay_opaque() {
        let error = ContentError::from(RepoError::from_persistence("connection reset"));
        assert!(matches!(error, ContentError::Repo(RepoError::Persistence(_))));
    }
}
