pub(crate) mod auth;
pub(crate) mod health;
pub(crate) mod posts;
pub(crate) mod tags;
pub(crate) mod users;
