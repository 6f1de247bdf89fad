use std::sync::Arc;

use tracing::{info, warn};

use crate::application::error::ContentError;
use crate::application::repos::{CreateGroupParams, GroupsRepo, GroupsWriteRepo, RepoError};
use crate::domain::entities::GroupRecord;
use crate::domain::slug::{SlugAsyncError, SlugError, generate_unique_slug};
use crate::domain::validation::{validate_group_title, validate_slug};

#[derive(Debug, Clone)]
pub struct CreateGroupCommand {
    pub title: String,
    /// Leave blank to derive a slug from the title.
    pub slug: String,
    pub description: String,
}

#[derive(Clone)]
pub struct GroupService {
    reader: Arc<dyn GroupsRepo>,
    writer: Arc<dyn GroupsWriteRepo>,
}

impl GroupService {
    pub fn new(reader: Arc<dyn GroupsRepo>, writer: Arc<dyn GroupsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn create_group(
        &self,
        command: CreateGroupCommand,
    ) -> Result<GroupRecord, ContentError> {
        let CreateGroupCommand {
            title,
            slug,
            description,
        } = command;

        let title = validate_group_title(&title)?;
        let slug = if slug.trim().is_empty() {
            self.derive_unique_slug(&title).await?
        } else {
            validate_slug(&slug)?
        };

        let params = CreateGroupParams {
            title,
            slug: slug.clone(),
            description: description.trim().to_string(),
        };

        match self.writer.create_group(params).await {
            Ok(group) => {
                info!(
                    target = "application::groups::create_group",
                    group_id = group.id,
                    slug = %group.slug,
                    "group created"
                );
                Ok(group)
            }
            Err(RepoError::Duplicate { .. }) => Err(ContentError::conflict(format!(
                "group slug `{slug}` already exists"
            ))),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<GroupRecord, ContentError> {
        self.reader
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| ContentError::not_found("group"))
    }

    pub async fn list_groups(&self) -> Result<Vec<GroupRecord>, ContentError> {
        self.reader.list_groups().await.map_err(ContentError::from)
    }

    /// Remove a group that no post references any more.
    pub async fn delete_group(&self, id: i64) -> Result<GroupRecord, ContentError> {
        let group = self
            .reader
            .find_group(id)
            .await?
            .ok_or_else(|| ContentError::not_found("group"))?;

        if let Err(err) = self.writer.delete_group(id).await {
            warn!(
                target = "application::groups::delete_group",
                group_id = id,
                slug = %group.slug,
                error = %err,
                "group removal rejected"
            );
            return Err(err.into());
        }

        info!(
            target = "application::groups::delete_group",
            group_id = id,
            slug = %group.slug,
            "group removed"
        );
        Ok(group)
    }

    async fn derive_unique_slug(&self, title: &str) -> Result<String, ContentError> {
        let reader = self.reader.clone();
        let result = generate_unique_slug(title, move |candidate| {
            let reader = reader.clone();
            let candidate = candidate.to_string();
            async move {
                reader
                    .find_by_slug(&candidate)
                    .await
                    .map(|existing| existing.is_none())
            }
        })
        .await;

        match result {
            Ok(slug) => Ok(slug),
            Err(SlugAsyncError::Slug(SlugError::Exhausted { base })) => Err(
                ContentError::conflict(format!("no free slug derived from `{base}`")),
            ),
            Err(SlugAsyncError::Slug(err)) => Err(ContentError::validation(err.to_string())),
            Err(SlugAsyncError::Predicate(err)) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryRepositories;

    fn service() -> GroupService {
        let repos = Arc::new(InMemoryRepositories::new());
        GroupService::new(repos.clone(), repos)
    }

    fn command(title: &str, slug: &str) -> CreateGroupCommand {
        CreateGroupCommand {
            title: title.to_string(),
            slug: slug.to_string(),
            description: "Тестовое описание".to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let groups = service();
        groups
            .create_group(command("Тестовое имя", "test-slug"))
            .await
            .expect("first group");

        let err = groups
            .create_group(command("Другое имя", "test-slug"))
            .await
            .expect_err("duplicate slug");
        assert!(err.is_conflict(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn blank_slug_is_derived_from_title() {
        let groups = service();
        let first = groups
            .create_group(command("Rust Weekly", ""))
            .await
            .expect("derived slug");
        let second = groups
            .create_group(command("Rust Weekly", " "))
            .await
            .expect("suffixed slug");

        assert_eq!(first.slug, "rust-weekly");
        assert_eq!(second.slug, "rust-weekly-2");
    }

    #[tokio::test]
    async fn malformed_slug_is_rejected() {
        let err = service()
            .create_group(command("Title", "not a slug"))
            .await
            .expect_err("bad slug");
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let err = service().find_by_slug("missing").await.expect_err("missing");
        assert!(err.is_not_found());
    }
}
