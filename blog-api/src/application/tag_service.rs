use std::sync::Arc;

use crate::data::tag_repository::TagRepository;
use crate::domain::access::{Actor, require_actor};
use crate::domain::error::DomainError;
use crate::domain::patch::Patch;
use crate::domain::tag::{CreateTagRequest, PatchTagRequest, Tag};

pub(crate) struct TagService {
    tags: Arc<dyn TagRepository>,
}

impl TagService {
    pub(crate) fn new(tags: Arc<dyn TagRepository>) -> Self {
        Self { tags }
    }

    pub(crate) async fn create_tag(
        &self,
        actor: Option<&Actor>,
        req: CreateTagRequest,
    ) -> Result<Tag, DomainError> {
        require_actor(actor)?;
        let req = req.validate()?;

        let tag = self.tags.create_tag(&req.name).await?;
        tracing::info!(tag_id = tag.id, name = %tag.name, "tag created");
        Ok(tag)
    }

    pub(crate) async fn get_tag(&self, id: i64) -> Result<Tag, DomainError> {
        self.tags
            .get_tag(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("tag id: {id}")))
    }

    /// Blank filters list everything.
    pub(crate) async fn list_tags(&self, name_contains: Option<&str>) -> Result<Vec<Tag>, DomainError> {
        let filter = name_contains.map(str::trim).filter(|name| !name.is_empty());
        self.tags.list_tags(filter).await
    }

    /// PUT: the name is the only field, so a full replace is a patch that sets it.
    pub(crate) async fn update_tag(
        &self,
        actor: Option<&Actor>,
        id: i64,
        req: CreateTagRequest,
    ) -> Result<Tag, DomainError> {
        self.patch_tag(
            actor,
            id,
            PatchTagRequest {
                name: Patch::Value(req.name),
            },
        )
        .await
    }

    pub(crate) async fn patch_tag(
        &self,
        actor: Option<&Actor>,
        id: i64,
        req: PatchTagRequest,
    ) -> Result<Tag, DomainError> {
        require_actor(actor)?;
        let mut tag = self.get_tag(id).await?;
        tag.apply(req.validate()?);

        let tag = self
            .tags
            .update_tag(&tag)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("tag id: {id}")))?;
        tracing::info!(tag_id = id, "tag updated");
        Ok(tag)
    }

    pub(crate) async fn delete_tag(&self, actor: Option<&Actor>, id: i64) -> Result<(), DomainError> {
        require_actor(actor)?;

        if !self.tags.delete_tag(id).await? {
            return Err(DomainError::NotFound(format!("tag id: {id}")));
        }
        tracing::info!(tag_id = id, "tag deleted");
        Ok(())
    }
}
