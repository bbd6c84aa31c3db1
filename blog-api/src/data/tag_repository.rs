use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::tag::Tag;

#[async_trait]
pub(crate) trait TagRepository: Send + Sync {
    async fn create_tag(&self, name: &str) -> Result<Tag, DomainError>;
    async fn get_tag(&self, id: i64) -> Result<Option<Tag>, DomainError>;
    /// All tags ordered by name, optionally narrowed to a case-insensitive substring.
    async fn list_tags(&self, name_contains: Option<&str>) -> Result<Vec<Tag>, DomainError>;
    /// Tags for the given ids. Unknown ids are skipped.
    async fn find_all_by_id(&self, ids: &[i64]) -> Result<Vec<Tag>, DomainError>;
    async fn update_tag(&self, tag: &Tag) -> Result<Option<Tag>, DomainError>;
    /// Removes the tag and detaches it from every post.
    async fn delete_tag(&self, id: i64) -> Result<bool, DomainError>;
}
