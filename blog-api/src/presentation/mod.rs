use std::sync::Arc;

use crate::application::auth_service::AuthService;
use crate::application::post_service::{PostService, TagResolution};
use crate::application::tag_service::TagService;
use crate::application::user_service::UserService;
use crate::data::Repositories;
use crate::infrastructure::jwt::JwtService;

pub(crate) mod http;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) auth_service: Arc<AuthService>,
    pub(crate) user_service: Arc<UserService>,
    pub(crate) post_service: Arc<PostService>,
    pub(crate) tag_service: Arc<TagService>,
    pub(crate) jwt: Arc<JwtService>,
}

impl AppState {
    pub(crate) fn new(
        repos: Repositories,
        jwt: Arc<JwtService>,
        tag_resolution: TagResolution,
    ) -> Self {
        let Repositories { users, posts, tags } = repos;
        Self {
            auth_service: Arc::new(AuthService::new(users.clone(), jwt.clone())),
            user_service: Arc::new(UserService::new(users.clone())),
            post_service: Arc::new(
                PostService::new(posts, users, tags.clone()).with_tag_resolution(tag_resolution),
            ),
            tag_service: Arc::new(TagService::new(tags)),
            jwt,
        }
    }
}
