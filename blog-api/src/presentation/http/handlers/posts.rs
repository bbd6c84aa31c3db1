use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::post_service::ListPostsResult;
use crate::data::post_repository::PostSort;
use crate::domain::access::Actor;
use crate::domain::error::{DomainError, FieldErrors};
use crate::domain::patch::Patch;
use crate::domain::post::{CreatePostRequest, PatchPostRequest, Post, UpdatePostRequest};
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppResult;
use crate::presentation::http::extract::{AppJson, AppPath, AppQuery};
use crate::presentation::http::middleware::auth::AuthenticatedUser;

const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePostDto {
    pub(crate) title: String,
    pub(crate) content: String,
    #[serde(default)]
    pub(crate) published: bool,
    /// Must be the caller's own id when given.
    pub(crate) user_id: Option<i64>,
    #[serde(default)]
    pub(crate) tag_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdatePostDto {
    pub(crate) title: String,
    pub(crate) content: String,
    /// Omitted keeps the current flag.
    pub(crate) published: Option<bool>,
    /// Omitted keeps the current tags, `null` or `[]` removes them.
    #[serde(default)]
    #[schema(value_type = Option<Vec<i64>>)]
    pub(crate) tag_ids: Patch<Vec<i64>>,
}

/// Only the keys present in the body are changed.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PatchPostDto {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub(crate) title: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub(crate) content: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<bool>)]
    pub(crate) published: Patch<bool>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<i64>>)]
    pub(crate) tag_ids: Patch<Vec<i64>>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ListPostsQuery {
    #[validate(range(min = 1))]
    pub(crate) page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub(crate) size: Option<u32>,
    pub(crate) sort: Option<String>,
    pub(crate) published: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostDto {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) published: bool,
    pub(crate) user_id: i64,
    pub(crate) tag_ids: Vec<i64>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostPageDto {
    pub(crate) content: Vec<PostDto>,
    pub(crate) page: u32,
    pub(crate) size: u32,
    pub(crate) total_elements: i64,
    pub(crate) total_pages: i64,
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            published: post.published,
            user_id: post.user_id,
            tag_ids: post.tag_ids,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<ListPostsResult> for PostPageDto {
    fn from(result: ListPostsResult) -> Self {
        let total_pages = result.total_pages();
        Self {
            content: result.posts.into_iter().map(PostDto::from).collect(),
            page: result.page,
            size: result.page_size,
            total_elements: result.total,
            total_pages,
        }
    }
}

impl From<CreatePostDto> for CreatePostRequest {
    fn from(dto: CreatePostDto) -> Self {
        Self {
            title: dto.title,
            content: dto.content,
            published: dto.published,
            user_id: dto.user_id,
            tag_ids: dto.tag_ids,
        }
    }
}

impl From<UpdatePostDto> for UpdatePostRequest {
    fn from(dto: UpdatePostDto) -> Self {
        let tag_ids = match dto.tag_ids {
            Patch::Absent => None,
            Patch::Null => Some(Vec::new()),
            Patch::Value(ids) => Some(ids),
        };
        Self {
            title: dto.title,
            content: dto.content,
            published: dto.published,
            tag_ids,
        }
    }
}

impl From<PatchPostDto> for PatchPostRequest {
    fn from(dto: PatchPostDto) -> Self {
        Self {
            title: dto.title,
            content: dto.content,
            published: dto.published,
            tag_ids: dto.tag_ids,
        }
    }
}

fn parse_sort(raw: Option<&str>) -> Result<PostSort, DomainError> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(PostSort::default()),
        Some(raw) => PostSort::parse(raw).ok_or_else(|| {
            FieldErrors::single(
                "sort",
                "must be createdAt|updatedAt|title|id, optionally followed by ,asc or ,desc",
            )
            .into()
        }),
    }
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number (default 1)"),
        ("size" = Option<u32>, Query, description = "Items per page, 1..=100 (default 20)"),
        ("sort" = Option<String>, Query, description = "field[,asc|desc], field one of createdAt, updatedAt, title, id (default createdAt,desc)"),
        ("published" = Option<bool>, Query, description = "Filter by published flag (default true)")
    ),
    responses(
        (status = 200, description = "Posts listed", body = PostPageDto),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_posts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListPostsQuery>,
) -> AppResult<Json<PostPageDto>> {
    query.validate()?;
    let sort = parse_sort(query.sort.as_deref())?;

    let result = state
        .post_service
        .list_posts(
            query.published.unwrap_or(true),
            query.page.unwrap_or(1),
            query.size.unwrap_or(DEFAULT_PAGE_SIZE),
            sort,
        )
        .await?;

    Ok(Json(PostPageDto::from(result)))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post found", body = PostDto),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<PostDto>> {
    let post = state.post_service.get_post(id).await?;
    Ok(Json(PostDto::from(post)))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Post created", body = PostDto),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "userId is not the caller"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    AppJson(dto): AppJson<CreatePostDto>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let actor = user.map(Actor::from);
    let post = state
        .post_service
        .create_post(actor.as_ref(), dto.into())
        .await?;
    Ok((StatusCode::CREATED, Json(PostDto::from(post))))
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = UpdatePostDto,
    responses(
        (status = 200, description = "Post updated", body = PostDto),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Post not found"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_post(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    AppPath(id): AppPath<i64>,
    AppJson(dto): AppJson<UpdatePostDto>,
) -> AppResult<Json<PostDto>> {
    let actor = user.map(Actor::from);
    let post = state
        .post_service
        .update_post(actor.as_ref(), id, dto.into())
        .await?;
    Ok(Json(PostDto::from(post)))
}

#[utoipa::path(
    patch,
    path = "/api/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = PatchPostDto,
    responses(
        (status = 200, description = "Post patched", body = PostDto),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Post not found"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn patch_post(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    AppPath(id): AppPath<i64>,
    AppJson(dto): AppJson<PatchPostDto>,
) -> AppResult<Json<PostDto>> {
    let actor = user.map(Actor::from);
    let post = state
        .post_service
        .patch_post(actor.as_ref(), id, dto.into())
        .await?;
    Ok(Json(PostDto::from(post)))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    AppPath(id): AppPath<i64>,
) -> AppResult<StatusCode> {
    let actor = user.map(Actor::from);
    state.post_service.delete_post(actor.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{PatchPostDto, UpdatePostDto, parse_sort};
    use crate::data::post_repository::{SortDirection, SortField};
    use crate::domain::patch::Patch;
    use crate::domain::post::UpdatePostRequest;

    #[test]
    fn patch_body_keeps_absent_and_null_apart() {
        let dto: PatchPostDto =
            serde_json::from_value(json!({ "title": "New", "tagIds": null })).expect("valid body");

        assert_eq!(dto.title, Patch::Value("New".to_string()));
        assert_eq!(dto.content, Patch::Absent);
        assert_eq!(dto.published, Patch::Absent);
        assert_eq!(dto.tag_ids, Patch::Null);
    }

    #[test]
    fn put_body_null_tags_clear_and_missing_tags_keep() {
        let cleared: UpdatePostDto = serde_json::from_value(
            json!({ "title": "Title", "content": "Content here", "tagIds": null }),
        )
        .expect("valid body");
        assert_eq!(UpdatePostRequest::from(cleared).tag_ids, Some(Vec::new()));

        let kept: UpdatePostDto =
            serde_json::from_value(json!({ "title": "Title", "content": "Content here" }))
                .expect("valid body");
        assert_eq!(UpdatePostRequest::from(kept).tag_ids, None);
    }

    #[test]
    fn sort_defaults_and_rejects_unknown_fields() {
        let default = parse_sort(None).expect("default");
        assert_eq!(default.field, SortField::CreatedAt);
        assert_eq!(default.direction, SortDirection::Desc);

        assert!(parse_sort(Some("author,asc")).is_err());
    }
}
