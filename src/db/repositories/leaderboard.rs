use sqlx::{PgPool, Result as SqlxResult};
use tracing::instrument;

use crate::db::prelude::{LeaderboardEntry, NewScore, PgError, PgResult};

pub struct LeaderboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LeaderboardRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> SqlxResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS leaderboard (
                id SERIAL PRIMARY KEY,
                nickname TEXT NOT NULL,
                score INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, entry), fields(nickname = %entry.nickname, score = entry.score))]
    pub async fn save_high_score(&self, entry: &NewScore) -> PgResult<()> {
        let res = sqlx::query(
            r#"
            INSERT INTO leaderboard (nickname, score, created_at)
            VALUES ($1, $2, NOW())
            "#,
        )
        .bind(&entry.nickname)
        .bind(entry.score)
        .execute(self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::error!(error = ?e, "high score save failure");
                Err(PgError::SaveFailed(e))
            }
        }
    }

    #[instrument(skip(self))]
    /// Highest scores first; equal scores keep submission order.
    pub async fn get_leaderboard(&self, limit: i64) -> SqlxResult<Vec<LeaderboardEntry>> {
        sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT nickname, score
            FROM leaderboard
            ORDER BY score DESC, created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await
    }
}
