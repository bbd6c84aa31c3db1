use std::convert::Infallible;

use axum::{
    extract::{OptionalFromRequestParts, Request, State},
    http::{HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::domain::access::Actor;
use crate::infrastructure::jwt::JwtService;
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppError;

/// Caller identity established from a verified bearer token.
#[derive(Debug, Clone)]
pub(crate) struct AuthenticatedUser {
    pub(crate) user_id: i64,
}

impl From<AuthenticatedUser> for Actor {
    fn from(user: AuthenticatedUser) -> Self {
        Actor::new(user.user_id)
    }
}

impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthenticatedUser>().cloned())
    }
}

/// Requests without `Authorization` pass through anonymously. A header that
/// is present but unusable ends the request with 401.
pub(crate) async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = match request.headers().get(header::AUTHORIZATION) {
        Some(value) => Some(authenticate(&state.jwt, value)?),
        None => None,
    };

    if let Some(user) = user {
        request.extensions_mut().insert(user);
    }
    Ok(next.run(request).await)
}

fn authenticate(jwt: &JwtService, value: &HeaderValue) -> Result<AuthenticatedUser, AppError> {
    let raw = value.to_str().map_err(|_| AppError::Unauthorized)?;
    let token = bearer_token(raw).ok_or(AppError::Unauthorized)?;

    let claims = jwt.verify_token(token).map_err(|err| {
        tracing::debug!(error = %err, "bearer token rejected");
        AppError::Unauthorized
    })?;

    Ok(AuthenticatedUser {
        user_id: claims.user_id,
    })
}

fn bearer_token(raw: &str) -> Option<&str> {
    let mut parts = raw.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}
