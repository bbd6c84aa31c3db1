use std::sync::Arc;

use sqlx::PgPool;

use self::repositories::memory::InMemoryStore;
use self::repositories::postgres::post_repository::PostgresPostRepository;
use self::repositories::postgres::tag_repository::PostgresTagRepository;
use self::repositories::postgres::user_repository::PostgresUserRepository;

pub(crate) mod post_repository;
pub(crate) mod repositories;
pub(crate) mod tag_repository;
pub(crate) mod user_repository;

use post_repository::PostRepository;
use tag_repository::TagRepository;
use user_repository::UserRepository;

/// The storage backends the services are wired with.
#[derive(Clone)]
pub(crate) struct Repositories {
    pub(crate) users: Arc<dyn UserRepository>,
    pub(crate) posts: Arc<dyn PostRepository>,
    pub(crate) tags: Arc<dyn TagRepository>,
}

impl Repositories {
    pub(crate) fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            posts: Arc::new(PostgresPostRepository::new(pool.clone())),
            tags: Arc::new(PostgresTagRepository::new(pool)),
        }
    }

    pub(crate) fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            posts: store.clone(),
            tags: store,
        }
    }
}
