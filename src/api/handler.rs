use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Json, debug_handler};
use tracing::instrument;

use crate::api::server::{AppState, JsonResult};
use crate::constants::LEADERBOARD_SIZE;
use crate::db::prelude::{LeaderboardEntry, LeaderboardRepository, NewScore, SaveAck};
use crate::games::prelude::{GamePair, StreamDetail, random_game_pair, top_streams};

#[instrument(skip(state))]
#[debug_handler]
pub async fn game_pair(State(state): State<Arc<AppState>>) -> JsonResult<GamePair> {
    let pair = random_game_pair(&state.helix, &state.tokens).await?;
    Ok(Json(pair))
}

#[instrument(skip(state))]
pub async fn game_streams(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
) -> JsonResult<Vec<StreamDetail>> {
    let streams = top_streams(&state.helix, &state.tokens, &game_id).await?;
    Ok(Json(streams))
}

#[instrument(skip(state))]
pub async fn save_high_score(
    State(state): State<Arc<AppState>>,
    Json(score): Json<NewScore>,
) -> JsonResult<SaveAck> {
    let score = score.validated()?;
    LeaderboardRepository::new(&state.db_pool)
        .save_high_score(&score)
        .await?;

    Ok(Json(SaveAck { success: true }))
}

#[instrument(skip(state))]
pub async fn leaderboard(State(state): State<Arc<AppState>>) -> JsonResult<Vec<LeaderboardEntry>> {
    let entries = LeaderboardRepository::new(&state.db_pool)
        .get_leaderboard(LEADERBOARD_SIZE)
        .await?;

    Ok(Json(entries))
}
