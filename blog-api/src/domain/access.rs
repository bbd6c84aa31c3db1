use super::error::DomainError;

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Actor {
    pub(crate) user_id: i64,
}

impl Actor {
    pub(crate) fn new(user_id: i64) -> Self {
        Self { user_id }
    }
}

pub(crate) fn require_actor(actor: Option<&Actor>) -> Result<&Actor, DomainError> {
    actor.ok_or(DomainError::Unauthenticated)
}

/// Allows a mutation only when the caller owns the resource.
pub(crate) fn ensure_owner<'a>(
    actor: Option<&'a Actor>,
    owner_id: i64,
    denied: &'static str,
) -> Result<&'a Actor, DomainError> {
    let actor = require_actor(actor)?;
    if actor.user_id != owner_id {
        return Err(DomainError::Forbidden(denied));
    }
    Ok(actor)
}
