use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::http::handlers::auth::{AuthResponseDto, LoginDto};
use crate::presentation::http::handlers::health::HealthzResponse;
use crate::presentation::http::handlers::posts::{
    CreatePostDto, PatchPostDto, PostDto, PostPageDto, UpdatePostDto,
};
use crate::presentation::http::handlers::tags::{PatchTagDto, TagDto, TagNameDto};
use crate::presentation::http::handlers::users::{
    PatchUserDto, RegisterUserDto, UpdateUserDto, UserDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::http::handlers::health::healthz,
        crate::presentation::http::handlers::auth::login,
        crate::presentation::http::handlers::posts::list_posts,
        crate::presentation::http::handlers::posts::get_post,
        crate::presentation::http::handlers::posts::create_post,
        crate::presentation::http::handlers::posts::update_post,
        crate::presentation::http::handlers::posts::patch_post,
        crate::presentation::http::handlers::posts::delete_post,
        crate::presentation::http::handlers::users::list_users,
        crate::presentation::http::handlers::users::get_user,
        crate::presentation::http::handlers::users::register_user,
        crate::presentation::http::handlers::users::update_user,
        crate::presentation::http::handlers::users::patch_user,
        crate::presentation::http::handlers::users::delete_user,
        crate::presentation::http::handlers::tags::list_tags,
        crate::presentation::http::handlers::tags::get_tag,
        crate::presentation::http::handlers::tags::posts_by_tag,
        crate::presentation::http::handlers::tags::create_tag,
        crate::presentation::http::handlers::tags::update_tag,
        crate::presentation::http::handlers::tags::patch_tag,
        crate::presentation::http::handlers::tags::delete_tag
    ),
    components(
        schemas(
            HealthzResponse,
            LoginDto,
            AuthResponseDto,
            CreatePostDto,
            UpdatePostDto,
            PatchPostDto,
            PostDto,
            PostPageDto,
            RegisterUserDto,
            UpdateUserDto,
            PatchUserDto,
            UserDto,
            TagNameDto,
            PatchTagDto,
            TagDto
        )
    ),
    tags(
        (name = "health", description = "Liveness probe"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "posts", description = "Post endpoints"),
        (name = "users", description = "User endpoints"),
        (name = "tags", description = "Tag endpoints")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
