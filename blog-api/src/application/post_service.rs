use std::sync::Arc;

use crate::data::post_repository::{NewPost, Pagination, PostQuery, PostRepository, PostSort};
use crate::data::tag_repository::TagRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::access::{Actor, ensure_owner, require_actor};
use crate::domain::error::{DomainError, FieldErrors};
use crate::domain::post::{CreatePostRequest, PatchPostRequest, Post, PostChanges, UpdatePostRequest};

const NOT_AUTHOR: &str = "only the author may modify this post";
pub(crate) const MAX_PAGE_SIZE: u32 = 100;

/// What to do with tag ids that match no stored tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum TagResolution {
    #[default]
    DropMissing,
    RejectMissing,
}

#[derive(Debug, Clone)]
pub(crate) struct ListPostsResult {
    pub(crate) posts: Vec<Post>,
    pub(crate) page: u32,
    pub(crate) page_size: u32,
    pub(crate) total: i64,
}

impl ListPostsResult {
    pub(crate) fn total_pages(&self) -> i64 {
        let size = i64::from(self.page_size.max(1));
        (self.total + size - 1) / size
    }
}

pub(crate) struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    tags: Arc<dyn TagRepository>,
    tag_resolution: TagResolution,
}

impl PostService {
    pub(crate) fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        tags: Arc<dyn TagRepository>,
    ) -> Self {
        Self {
            posts,
            users,
            tags,
            tag_resolution: TagResolution::default(),
        }
    }

    pub(crate) fn with_tag_resolution(mut self, tag_resolution: TagResolution) -> Self {
        self.tag_resolution = tag_resolution;
        self
    }

    pub(crate) async fn create_post(
        &self,
        actor: Option<&Actor>,
        req: CreatePostRequest,
    ) -> Result<Post, DomainError> {
        let actor = require_actor(actor)?;
        let req = req.validate()?;

        if let Some(user_id) = req.user_id.filter(|id| *id != actor.user_id) {
            tracing::warn!(
                actor_id = actor.user_id,
                user_id,
                "post creation on behalf of another user denied"
            );
            return Err(DomainError::Forbidden("posts can only be created as yourself"));
        }
        if !self.users.user_exists(actor.user_id).await? {
            return Err(DomainError::NotFound(format!("user id: {}", actor.user_id)));
        }

        let tag_ids = self.resolve_tag_ids(req.tag_ids).await?;
        let post = self
            .posts
            .create_post(NewPost {
                title: req.title,
                content: req.content,
                published: req.published,
                user_id: actor.user_id,
                tag_ids,
            })
            .await?;

        tracing::info!(post_id = post.id, user_id = post.user_id, "post created");
        Ok(post)
    }

    pub(crate) async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .get_post(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("post id: {id}")))
    }

    pub(crate) async fn list_posts(
        &self,
        published: bool,
        page: u32,
        page_size: u32,
        sort: PostSort,
    ) -> Result<ListPostsResult, DomainError> {
        let errors = FieldErrors::default()
            .with("page", (page < 1).then_some("must be >= 1"))
            .with(
                "size",
                (!(1..=MAX_PAGE_SIZE).contains(&page_size)).then_some("must be 1..100"),
            );
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let posts = self
            .posts
            .list_posts(PostQuery {
                published,
                pagination: Pagination { page, page_size },
                sort,
            })
            .await?;
        let total = self.posts.count_posts(published).await?;

        Ok(ListPostsResult {
            posts,
            page,
            page_size,
            total,
        })
    }

    pub(crate) async fn update_post(
        &self,
        actor: Option<&Actor>,
        id: i64,
        req: UpdatePostRequest,
    ) -> Result<Post, DomainError> {
        let post = self.load_owned(actor, id).await?;
        let changes = req.validate()?;
        self.save(post, changes).await
    }

    pub(crate) async fn patch_post(
        &self,
        actor: Option<&Actor>,
        id: i64,
        req: PatchPostRequest,
    ) -> Result<Post, DomainError> {
        let post = self.load_owned(actor, id).await?;
        let changes = req.validate()?;
        self.save(post, changes).await
    }

    pub(crate) async fn delete_post(&self, actor: Option<&Actor>, id: i64) -> Result<(), DomainError> {
        self.load_owned(actor, id).await?;

        if !self.posts.delete_post(id).await? {
            return Err(DomainError::NotFound(format!("post id: {id}")));
        }
        tracing::info!(post_id = id, "post deleted");
        Ok(())
    }

    pub(crate) async fn posts_by_tag(&self, tag_id: i64) -> Result<Vec<Post>, DomainError> {
        if self.tags.get_tag(tag_id).await?.is_none() {
            return Err(DomainError::NotFound(format!("tag id: {tag_id}")));
        }
        self.posts.list_posts_by_tag(tag_id).await
    }

    /// Authenticated caller, existing post, caller is the author. In that order.
    async fn load_owned(&self, actor: Option<&Actor>, id: i64) -> Result<Post, DomainError> {
        require_actor(actor)?;
        let post = self.get_post(id).await?;
        ensure_owner(actor, post.user_id, NOT_AUTHOR)
            .inspect_err(|err| tracing::warn!(post_id = id, error = %err, "post change denied"))?;
        Ok(post)
    }

    async fn save(&self, mut post: Post, mut changes: PostChanges) -> Result<Post, DomainError> {
        if let Some(tag_ids) = changes.tag_ids.take() {
            changes.tag_ids = Some(self.resolve_tag_ids(tag_ids).await?);
        }

        let id = post.id;
        post.apply(changes);
        let post = self
            .posts
            .update_post(&post)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("post id: {id}")))?;

        tracing::info!(post_id = id, "post updated");
        Ok(post)
    }

    async fn resolve_tag_ids(&self, tag_ids: Vec<i64>) -> Result<Vec<i64>, DomainError> {
        if tag_ids.is_empty() {
            return Ok(tag_ids);
        }

        let found: Vec<i64> = self
            .tags
            .find_all_by_id(&tag_ids)
            .await?
            .into_iter()
            .map(|tag| tag.id)
            .collect();

        if found.len() != tag_ids.len() {
            match self.tag_resolution {
                TagResolution::DropMissing => {
                    tracing::debug!(requested = ?tag_ids, kept = ?found, "unknown tag ids dropped");
                }
                TagResolution::RejectMissing => {
                    return Err(FieldErrors::single("tagIds", "contains unknown tag ids").into());
                }
            }
        }
        Ok(found)
    }
}
