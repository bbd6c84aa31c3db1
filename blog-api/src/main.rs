use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::post_service::TagResolution;
use data::Repositories;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::jwt::JwtService;
use infrastructure::logging::init_logging;
use infrastructure::settings::Settings;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let repos = match &settings.database_url {
        Some(database_url) => {
            let pool = create_pool(database_url, settings.db_max_connections).await?;
            run_migrations(&pool).await?;
            info!("connected to postgres, migrations applied");
            Repositories::postgres(pool)
        }
        None => {
            warn!("DATABASE_URL not set, data lives in process memory and is lost on exit");
            Repositories::in_memory()
        }
    };

    let jwt = Arc::new(JwtService::new(
        &settings.jwt_secret,
        settings.jwt_ttl_seconds,
    ));
    let tag_resolution = if settings.reject_unknown_tags {
        TagResolution::RejectMissing
    } else {
        TagResolution::DropMissing
    };
    let state = AppState::new(repos, jwt, tag_resolution);

    server::run_http(&settings, state).await
}
