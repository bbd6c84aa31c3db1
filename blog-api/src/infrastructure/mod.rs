pub mod database;
pub(crate) mod jwt;
pub mod logging;
pub(crate) mod password;
pub mod settings;
