use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::error::DomainError;
use crate::domain::user::User;

#[derive(Debug, Clone)]
pub(crate) struct UserCredentials {
    pub(crate) user: User,
    pub(crate) password_hash: String,
}

#[derive(Debug, Clone)]
pub(crate) struct NewUser {
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) birthday: Option<NaiveDate>,
    pub(crate) password_hash: String,
}

#[async_trait]
pub(crate) trait UserRepository: Send + Sync {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError>;
    async fn get_user(&self, id: i64) -> Result<Option<User>, DomainError>;
    async fn user_exists(&self, id: i64) -> Result<bool, DomainError>;
    async fn list_users(&self) -> Result<Vec<User>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError>;
    /// Writes the profile fields of `user`, and the digest when one is given.
    async fn update_user(
        &self,
        user: &User,
        password_hash: Option<String>,
    ) -> Result<Option<User>, DomainError>;
    /// Removes the user together with their posts.
    async fn delete_user(&self, id: i64) -> Result<bool, DomainError>;
}
