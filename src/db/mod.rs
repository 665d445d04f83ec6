use std::sync::LazyLock;

use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::util::env::{self, EnvErr};

pub mod models;
pub mod repositories;

pub mod prelude {
    pub use crate::db::db_pool;
    pub use crate::db::{PgError, PgResult};

    pub use crate::db::models::leaderboard::{LeaderboardEntry, NewScore, SaveAck, ScoreRejection};
    pub use crate::db::repositories::leaderboard::LeaderboardRepository;
}

static DB_POOL: LazyLock<OnceCell<Db>> = LazyLock::new(OnceCell::new);
pub async fn db_pool() -> PgResult<&'static PgPool> {
    Ok(&DB_POOL
        .get_or_try_init(|| async { Db::new_pool().await })
        .await?
        .pool)
}

struct Db {
    pool: PgPool,
}

impl Db {
    pub async fn new_pool() -> PgResult<Self> {
        let db_url = &env::env().await?.database_url;
        let pool = sqlx::PgPool::connect(db_url).await?;

        tracing::debug!("connected postgres pool");
        Ok(Self { pool })
    }
}

pub type PgResult<T> = core::result::Result<T, PgError>;

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error)]
pub enum PgError {
    #[error(transparent)]
    SqlxError(#[from] sqlx::Error),

    #[error("failed to save high score")]
    SaveFailed(#[source] sqlx::Error),

    #[error("{0}")]
    EnvError(#[from] EnvErr),
}
