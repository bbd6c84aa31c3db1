use chrono::{DateTime, Utc};

use super::error::{DomainError, FieldErrors};
use super::patch::{Patch, merge};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) published: bool,
    pub(crate) user_id: i64,
    pub(crate) tag_ids: Vec<i64>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub(crate) struct CreatePostRequest {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) published: bool,
    pub(crate) user_id: Option<i64>,
    pub(crate) tag_ids: Vec<i64>,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let title = normalize_title(&self.title);
        let content = normalize_content(&self.content);

        match (title, content) {
            (Ok(title), Ok(content)) => Ok(Self {
                title,
                content,
                published: self.published,
                user_id: self.user_id,
                tag_ids: canonical_tag_ids(self.tag_ids),
            }),
            (title, content) => Err(FieldErrors::default()
                .with("title", title.err())
                .with("content", content.err())
                .into()),
        }
    }
}

/// Full replacement of a post's editable fields.
#[derive(Debug, Clone)]
pub(crate) struct UpdatePostRequest {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) published: Option<bool>,
    pub(crate) tag_ids: Option<Vec<i64>>,
}

impl UpdatePostRequest {
    pub(crate) fn validate(self) -> Result<PostChanges, DomainError> {
        let title = normalize_title(&self.title);
        let content = normalize_content(&self.content);

        match (title, content) {
            (Ok(title), Ok(content)) => Ok(PostChanges {
                title: Some(title),
                content: Some(content),
                published: self.published,
                tag_ids: self.tag_ids.map(canonical_tag_ids),
            }),
            (title, content) => Err(FieldErrors::default()
                .with("title", title.err())
                .with("content", content.err())
                .into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PatchPostRequest {
    pub(crate) title: Patch<String>,
    pub(crate) content: Patch<String>,
    pub(crate) published: Patch<bool>,
    pub(crate) tag_ids: Patch<Vec<i64>>,
}

impl PatchPostRequest {
    /// `tag_ids: null` is read as "no tags".
    pub(crate) fn validate(self) -> Result<PostChanges, DomainError> {
        let title = self
            .title
            .into_required()
            .and_then(|title| title.as_deref().map(normalize_title).transpose());
        let content = self
            .content
            .into_required()
            .and_then(|content| content.as_deref().map(normalize_content).transpose());
        let published = self.published.into_required();
        let tag_ids = match self.tag_ids {
            Patch::Absent => None,
            Patch::Null => Some(Vec::new()),
            Patch::Value(ids) => Some(canonical_tag_ids(ids)),
        };

        match (title, content, published) {
            (Ok(title), Ok(content), Ok(published)) => Ok(PostChanges {
                title,
                content,
                published,
                tag_ids,
            }),
            (title, content, published) => Err(FieldErrors::default()
                .with("title", title.err())
                .with("content", content.err())
                .with("published", published.err())
                .into()),
        }
    }
}

/// Validated field changes, each `None` meaning "leave as is".
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PostChanges {
    pub(crate) title: Option<String>,
    pub(crate) content: Option<String>,
    pub(crate) published: Option<bool>,
    pub(crate) tag_ids: Option<Vec<i64>>,
}

impl Post {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: i64,
        title: impl Into<String>,
        content: impl Into<String>,
        published: bool,
        user_id: i64,
        tag_ids: Vec<i64>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        validate_positive_i64("id", id)?;
        validate_positive_i64("user_id", user_id)?;

        if updated_at < created_at {
            return Err(FieldErrors::single("updated_at", "must be >= created_at").into());
        }

        Ok(Self {
            id,
            title: title.into(),
            content: content.into(),
            published,
            user_id,
            tag_ids: canonical_tag_ids(tag_ids),
            created_at,
            updated_at,
        })
    }

    /// Merges validated changes in place. Persisting is up to the caller.
    pub(crate) fn apply(&mut self, changes: PostChanges) {
        merge(&mut self.title, changes.title);
        merge(&mut self.content, changes.content);
        merge(&mut self.published, changes.published);
        merge(&mut self.tag_ids, changes.tag_ids.map(canonical_tag_ids));
    }
}

pub(crate) fn canonical_tag_ids(mut tag_ids: Vec<i64>) -> Vec<i64> {
    tag_ids.sort_unstable();
    tag_ids.dedup();
    tag_ids
}

fn validate_positive_i64(field: &'static str, value: i64) -> Result<(), DomainError> {
    if value <= 0 {
        return Err(FieldErrors::single(field, "must be > 0").into());
    }
    Ok(())
}

fn normalize_title(title: &str) -> Result<String, &'static str> {
    let title = title.trim();
    if title.is_empty() {
        return Err("must not be blank");
    }
    let len = title.chars().count();
    if !(3..=100).contains(&len) {
        return Err("must be 3..100 chars");
    }
    Ok(title.to_string())
}

fn normalize_content(content: &str) -> Result<String, &'static str> {
    let content = content.trim();
    if content.is_empty() {
        return Err("must not be blank");
    }
    if content.chars().count() < 10 {
        return Err("must be at least 10 chars");
    }
    Ok(content.to_string())
}
