use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::post::Post;

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) published: bool,
    pub(crate) user_id: i64,
    pub(crate) tag_ids: Vec<i64>,
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pagination {
    pub(crate) page: u32,
    pub(crate) page_size: u32,
}

impl Pagination {
    pub(crate) fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub(crate) fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * self.limit()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortField {
    CreatedAt,
    UpdatedAt,
    Title,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortDirection {
    Asc,
    Desc,
}

/// Ordering of a post listing. Ties are always broken by id in the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PostSort {
    pub(crate) field: SortField,
    pub(crate) direction: SortDirection,
}

impl Default for PostSort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl PostSort {
    /// Parses `field[,asc|desc]`, e.g. `createdAt,desc` or `title`.
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(',').map(str::trim);
        let field = match parts.next()? {
            "createdAt" => SortField::CreatedAt,
            "updatedAt" => SortField::UpdatedAt,
            "title" => SortField::Title,
            "id" => SortField::Id,
            _ => return None,
        };
        let direction = match parts.next() {
            None => SortDirection::Asc,
            Some(value) if value.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            Some(value) if value.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            Some(_) => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self { field, direction })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PostQuery {
    pub(crate) published: bool,
    pub(crate) pagination: Pagination,
    pub(crate) sort: PostSort,
}

#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError>;
    /// Writes every field of `post` and refreshes `updated_at`.
    /// `None` when the post no longer exists.
    async fn update_post(&self, post: &Post) -> Result<Option<Post>, DomainError>;
    async fn delete_post(&self, id: i64) -> Result<bool, DomainError>;
    async fn list_posts(&self, query: PostQuery) -> Result<Vec<Post>, DomainError>;
    async fn count_posts(&self, published: bool) -> Result<i64, DomainError>;
    /// Published posts carrying `tag_id`, newest first.
    async fn list_posts_by_tag(&self, tag_id: i64) -> Result<Vec<Post>, DomainError>;
}
