use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::access::Actor;
use crate::domain::patch::Patch;
use crate::domain::user::{PatchUserRequest, RegisterRequest, UpdateUserRequest, User};
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppResult;
use crate::presentation::http::extract::{AppJson, AppPath};
use crate::presentation::http::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterUserDto {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    /// Write-only, 8..=128 chars.
    pub(crate) password: String,
    pub(crate) birthday: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateUserDto {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    /// Omitted or null clears the stored birthday.
    pub(crate) birthday: Option<NaiveDate>,
    /// Omitted or empty keeps the current password.
    pub(crate) password: Option<String>,
}

/// Only the keys present in the body are changed.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PatchUserDto {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub(crate) first_name: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub(crate) last_name: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub(crate) email: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<NaiveDate>)]
    pub(crate) birthday: Patch<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserDto {
    pub(crate) id: i64,
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) birthday: Option<NaiveDate>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            birthday: user.birthday,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<RegisterUserDto> for RegisterRequest {
    fn from(dto: RegisterUserDto) -> Self {
        Self {
            first_name: dto.first_name,
            last_name: dto.last_name,
            email: dto.email,
            password: dto.password,
            birthday: dto.birthday,
        }
    }
}

impl From<UpdateUserDto> for UpdateUserRequest {
    fn from(dto: UpdateUserDto) -> Self {
        Self {
            first_name: dto.first_name,
            last_name: dto.last_name,
            email: dto.email,
            birthday: dto.birthday,
            password: dto.password,
        }
    }
}

impl From<PatchUserDto> for PatchUserRequest {
    fn from(dto: PatchUserDto) -> Self {
        Self {
            first_name: dto.first_name,
            last_name: dto.last_name,
            email: dto.email,
            birthday: dto.birthday,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All users ordered by id", body = [UserDto]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_users(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
) -> AppResult<Json<Vec<UserDto>>> {
    let actor = user.map(Actor::from);
    let users = state.user_service.list_users(actor.as_ref()).await?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<UserDto>> {
    let user = state.user_service.get_user(id).await?;
    Ok(Json(UserDto::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = RegisterUserDto,
    responses(
        (status = 201, description = "User registered", body = UserDto),
        (status = 409, description = "Email already in use"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn register_user(
    State(state): State<AppState>,
    AppJson(dto): AppJson<RegisterUserDto>,
) -> AppResult<(StatusCode, Json<UserDto>)> {
    let user = state.user_service.register(dto.into()).await?;
    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "User id")
    ),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User replaced", body = UserDto),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your profile"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_user(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    AppPath(id): AppPath<i64>,
    AppJson(dto): AppJson<UpdateUserDto>,
) -> AppResult<Json<UserDto>> {
    let actor = user.map(Actor::from);
    let user = state
        .user_service
        .update_user(actor.as_ref(), id, dto.into())
        .await?;
    Ok(Json(UserDto::from(user)))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    tag = "users",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "User id")
    ),
    request_body = PatchUserDto,
    responses(
        (status = 200, description = "User patched", body = UserDto),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your profile"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn patch_user(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    AppPath(id): AppPath<i64>,
    AppJson(dto): AppJson<PatchUserDto>,
) -> AppResult<Json<UserDto>> {
    let actor = user.map(Actor::from);
    let user = state
        .user_service
        .patch_user(actor.as_ref(), id, dto.into())
        .await?;
    Ok(Json(UserDto::from(user)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 204, description = "User and their posts deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your profile"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_user(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    AppPath(id): AppPath<i64>,
) -> AppResult<StatusCode> {
    let actor = user.map(Actor::from);
    state.user_service.delete_user(actor.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
