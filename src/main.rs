use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;

use crate::api::middleware::MiddlewareErr;
use crate::api::server::AppState;
use crate::db::prelude::{LeaderboardRepository, PgError};
use crate::util::env::EnvErr;
use crate::util::helix::Helix;
use crate::util::telemetry;
use crate::util::token::TokenProvider;

mod api;
mod constants;
mod db;
mod games;
mod util;

#[derive(Debug, Error)]
enum RunnerErr {
    #[error(transparent)]
    Env(#[from] EnvErr),

    #[error(transparent)]
    Db(#[from] PgError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Middleware(#[from] MiddlewareErr),

    #[error(transparent)]
    Std(#[from] Box<dyn std::error::Error>),
}

type Result<T> = core::result::Result<T, RunnerErr>;

#[tokio::main]
async fn main() -> Result<()> {
    let env = util::env::env().await?;
    let telemetry_registry = telemetry::Telemetry::new(env)?.register();

    tracing::info!("starting main application");

    let db_pool = db::prelude::db_pool().await?;
    LeaderboardRepository::new(db_pool).ensure_schema().await?;

    let state = Arc::new(AppState {
        helix: Helix::from_env(env),
        tokens: TokenProvider::from_env(env),
        db_pool: db_pool.clone(),
    });

    let cors = api::middleware::cors::cors_layer(&env.cors_allow_origins)?;
    let handles = api::server::start_server(state, cors, env.server_api_port).await;

    _ = join_all(handles).await;

    telemetry_registry.shutdown();
    Ok(())
}
