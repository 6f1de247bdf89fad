use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

/// Translate a sqlx failure into the repository taxonomy.
///
/// Constraint names come from `migrations/`; foreign-key violations on insert
/// mean the referenced row is missing, while violations raised by a delete
/// mean a protected row is still referenced.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Duplicate {
            constraint: db.constraint().unwrap_or("unknown").to_string(),
        },
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            if db.message().contains("update or delete on table") {
                RepoError::Rejected(DomainError::conflict(db.message().to_string()))
            } else {
                match referenced_entity(db.constraint()) {
                    Some(entity) => RepoError::Rejected(DomainError::not_found(entity)),
                    None => RepoError::InvalidInput {
                        message: db.message().to_string(),
                    },
                }
            }
        }
        sqlx::Error::Database(db) if db.is_check_violation() => match db.constraint() {
            Some("follows_not_self") => {
                RepoError::Rejected(DomainError::validation("users cannot follow themselves"))
            }
            _ => RepoError::InvalidInput {
                message: db.message().to_string(),
            },
        },
        sqlx::Error::Database(db) if db.message().contains("invalid input syntax") => {
            RepoError::InvalidInput {
                message: db.message().to_string(),
            }
        }
        sqlx::Error::Database(db) if db.message().contains("violates") => RepoError::Integrity {
            message: db.message().to_string(),
        },
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to user request") =>
        {
            RepoError::Timeout
        }
        other => RepoError::from_persistence(other),
    }
}

fn referenced_entity(constraint: Option<&str>) -> Option<&'static str> {
    match constraint? {
        "posts_author_id_fkey"
        | "comments_author_id_fkey"
        | "follows_user_id_fkey"
        | "follows_author_id_fkey" => Some("user"),
        "posts_group_id_fkey" => Some("group"),
        "comments_post_id_fkey" => Some("post"),
        _ => None,
    }
}

pub(crate) fn convert_count(value: i64) -> Result<u64, RepoError> {
    value
        .try_into()
        .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_side_constraints_name_their_parent() {
        assert_eq!(referenced_entity(Some("posts_group_id_fkey")), Some("group"));
        assert_eq!(referenced_entity(Some("comments_post_id_fkey")), Some("post"));
        assert_eq!(referenced_entity(Some("follows_author_id_fkey")), Some("user"));
        assert_eq!(referenced_entity(Some("something_else")), None);
        assert_eq!(referenced_entity(None), None);
    }

    #[test]
    fn missing_rows_map_to_not_found() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            RepoError::NotFound
        ));
    }

    #[test]
    fn negative_counts_are_rejected() {
        assert_eq!(convert_count(3).expect("count"), 3);
        assert!(convert_count(-1).is_err());
    }
}
