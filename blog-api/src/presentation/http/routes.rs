use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::presentation::AppState;
use crate::presentation::http::handlers::{auth, health, posts, tags, users};
use crate::presentation::http::middleware::auth::jwt_auth_middleware;

pub(crate) fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/login", post(auth::login))
        .merge(posts_router())
        .merge(users_router())
        .merge(tags_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .route("/healthz", get(health::healthz))
        .nest("/api", api)
        .with_state(state)
}

fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .patch(posts::patch_post)
                .delete(posts::delete_post),
        )
}

fn users_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users).post(users::register_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .patch(users::patch_user)
                .delete(users::delete_user),
        )
}

fn tags_router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(tags::list_tags).post(tags::create_tag))
        .route(
            "/tags/{id}",
            get(tags::get_tag)
                .put(tags::update_tag)
                .patch(tags::patch_tag)
                .delete(tags::delete_tag),
        )
        .route("/tags/{id}/posts", get(tags::posts_by_tag))
}
