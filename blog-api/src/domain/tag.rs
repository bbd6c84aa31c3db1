use super::error::{DomainError, FieldErrors};
use super::patch::{Patch, merge};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tag {
    pub(crate) id: i64,
    pub(crate) name: String,
}

#[derive(Debug, Clone)]
pub(crate) struct CreateTagRequest {
    pub(crate) name: String,
}

impl CreateTagRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let name = normalize_tag_name(&self.name).map_err(name_error)?;
        Ok(Self { name })
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PatchTagRequest {
    pub(crate) name: Patch<String>,
}

impl PatchTagRequest {
    pub(crate) fn validate(self) -> Result<TagChanges, DomainError> {
        let name = self
            .name
            .into_required()
            .and_then(|name| name.as_deref().map(normalize_tag_name).transpose())
            .map_err(name_error)?;
        Ok(TagChanges { name })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TagChanges {
    pub(crate) name: Option<String>,
}

impl Tag {
    pub(crate) fn new(id: i64, name: impl Into<String>) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(FieldErrors::single("id", "must be > 0").into());
        }
        Ok(Self {
            id,
            name: name.into(),
        })
    }

    pub(crate) fn apply(&mut self, changes: TagChanges) {
        merge(&mut self.name, changes.name);
    }
}

fn name_error(message: &'static str) -> DomainError {
    FieldErrors::single("name", message).into()
}

fn normalize_tag_name(name: &str) -> Result<String, &'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Err("must not be blank");
    }
    let len = name.chars().count();
    if !(2..=50).contains(&len) {
        return Err("must be 2..50 chars");
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::{CreateTagRequest, DomainError, PatchTagRequest, Tag, TagChanges};
    use crate::domain::patch::Patch;

    #[test]
    fn create_tag_request_trims_name() {
        let req = CreateTagRequest {
            name: "  rust ".to_string(),
        };
        assert_eq!(req.validate().expect("must validate").name, "rust");
    }

    #[test]
    fn create_tag_request_rejects_short_name() {
        let req = CreateTagRequest {
            name: "r".to_string(),
        };
        let err = req.validate().expect_err("must fail");
        assert!(matches!(err, DomainError::Validation(fields) if fields.get("name").is_some()));
    }

    #[test]
    fn patch_without_name_changes_nothing() {
        let changes = PatchTagRequest::default().validate().expect("must validate");
        assert_eq!(changes, TagChanges::default());

        let mut tag = Tag::new(1, "rust").expect("valid tag");
        tag.apply(changes);
        assert_eq!(tag.name, "rust");
    }

    #[test]
    fn patch_rejects_null_name() {
        let req = PatchTagRequest { name: Patch::Null };
        assert!(req.validate().is_err());
    }
}
