use std::sync::Arc;

use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::user::{LoginRequest, User};
use crate::infrastructure::jwt::JwtService;
use crate::infrastructure::password::{verify_against_dummy, verify_password};

#[derive(Debug, Clone)]
pub(crate) struct AuthResult {
    pub(crate) user: User,
    pub(crate) access_token: String,
}

pub(crate) struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt: Arc<JwtService>,
}

impl AuthService {
    pub(crate) fn new(users: Arc<dyn UserRepository>, jwt: Arc<JwtService>) -> Self {
        Self { users, jwt }
    }

    pub(crate) async fn login(&self, req: LoginRequest) -> Result<AuthResult, DomainError> {
        let req = req.validate()?;

        let Some(creds) = self.users.find_by_email(&req.email).await? else {
            verify_against_dummy(&req.password)?;
            tracing::warn!("login rejected: unknown email");
            return Err(DomainError::InvalidCredentials);
        };

        if let Err(err) = verify_password(&req.password, &creds.password_hash) {
            if matches!(err, DomainError::InvalidCredentials) {
                tracing::warn!(user_id = creds.user.id, "login rejected: wrong password");
            }
            return Err(err);
        }

        let access_token = self
            .jwt
            .generate_token(creds.user.id, &creds.user.email)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;

        tracing::info!(user_id = creds.user.id, "user logged in");
        Ok(AuthResult {
            user: creds.user,
            access_token,
        })
    }
}
