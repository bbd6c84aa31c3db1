pub(crate) mod access;
pub(crate) mod error;
pub(crate) mod patch;
pub(crate) mod post;
pub(crate) mod tag;
pub(crate) mod user;
