use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::access::Actor;
use crate::domain::patch::Patch;
use crate::domain::tag::{CreateTagRequest, PatchTagRequest, Tag};
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppResult;
use crate::presentation::http::extract::{AppJson, AppPath, AppQuery};
use crate::presentation::http::handlers::posts::PostDto;
use crate::presentation::http::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct TagNameDto {
    pub(crate) name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct PatchTagDto {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub(crate) name: Patch<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TagSearchQuery {
    #[validate(length(max = 50))]
    pub(crate) name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct TagDto {
    pub(crate) id: i64,
    pub(crate) name: String,
}

impl From<Tag> for TagDto {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}

impl From<TagNameDto> for CreateTagRequest {
    fn from(dto: TagNameDto) -> Self {
        Self { name: dto.name }
    }
}

#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "tags",
    params(
        ("name" = Option<String>, Query, description = "Case-insensitive substring of the tag name")
    ),
    responses(
        (status = 200, description = "Tags ordered by name", body = [TagDto]),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_tags(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TagSearchQuery>,
) -> AppResult<Json<Vec<TagDto>>> {
    query.validate()?;
    let tags = state.tag_service.list_tags(query.name.as_deref()).await?;
    Ok(Json(tags.into_iter().map(TagDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    tag = "tags",
    params(
        ("id" = i64, Path, description = "Tag id")
    ),
    responses(
        (status = 200, description = "Tag found", body = TagDto),
        (status = 404, description = "Tag not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_tag(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<TagDto>> {
    let tag = state.tag_service.get_tag(id).await?;
    Ok(Json(TagDto::from(tag)))
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}/posts",
    tag = "tags",
    params(
        ("id" = i64, Path, description = "Tag id")
    ),
    responses(
        (status = 200, description = "Published posts carrying the tag, newest first", body = [PostDto]),
        (status = 404, description = "Tag not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn posts_by_tag(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Vec<PostDto>>> {
    let posts = state.post_service.posts_by_tag(id).await?;
    Ok(Json(posts.into_iter().map(PostDto::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/tags",
    tag = "tags",
    security(
        ("bearer_auth" = [])
    ),
    request_body = TagNameDto,
    responses(
        (status = 201, description = "Tag created", body = TagDto),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Tag name taken"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_tag(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    AppJson(dto): AppJson<TagNameDto>,
) -> AppResult<(StatusCode, Json<TagDto>)> {
    let actor = user.map(Actor::from);
    let tag = state
        .tag_service
        .create_tag(actor.as_ref(), dto.into())
        .await?;
    Ok((StatusCode::CREATED, Json(TagDto::from(tag))))
}

#[utoipa::path(
    put,
    path = "/api/tags/{id}",
    tag = "tags",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Tag id")
    ),
    request_body = TagNameDto,
    responses(
        (status = 200, description = "Tag renamed", body = TagDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Tag not found"),
        (status = 409, description = "Tag name taken"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_tag(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    AppPath(id): AppPath<i64>,
    AppJson(dto): AppJson<TagNameDto>,
) -> AppResult<Json<TagDto>> {
    let actor = user.map(Actor::from);
    let tag = state
        .tag_service
        .update_tag(actor.as_ref(), id, dto.into())
        .await?;
    Ok(Json(TagDto::from(tag)))
}

#[utoipa::path(
    patch,
    path = "/api/tags/{id}",
    tag = "tags",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Tag id")
    ),
    request_body = PatchTagDto,
    responses(
        (status = 200, description = "Tag patched", body = TagDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Tag not found"),
        (status = 409, description = "Tag name taken"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn patch_tag(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    AppPath(id): AppPath<i64>,
    AppJson(dto): AppJson<PatchTagDto>,
) -> AppResult<Json<TagDto>> {
    let actor = user.map(Actor::from);
    let tag = state
        .tag_service
        .patch_tag(actor.as_ref(), id, PatchTagRequest { name: dto.name })
        .await?;
    Ok(Json(TagDto::from(tag)))
}

#[utoipa::path(
    delete,
    path = "/api/tags/{id}",
    tag = "tags",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Tag id")
    ),
    responses(
        (status = 204, description = "Tag deleted and detached from posts"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Tag not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_tag(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    AppPath(id): AppPath<i64>,
) -> AppResult<StatusCode> {
    let actor = user.map(Actor::from);
    state.tag_service.delete_tag(actor.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
