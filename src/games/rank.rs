use std::collections::HashMap;

use tracing::instrument;

use crate::constants::TOP_GAMES_LIMIT;
use crate::games::aggregate::{GameAggregate, aggregate_viewers};
use crate::games::enrich::enrich_games;
use crate::games::{GameErr, GameResult};
use crate::util::helix::{AuthHeaders, Helix, HelixGame};

/// A game's metadata joined with its summed viewer count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedGame {
    pub id: String,
    pub name: String,
    pub box_art_url: String,
    pub viewers: u64,
}

#[instrument(skip(helix, auth))]
/// Builds the most-watched games list, descending by viewers and at most [`TOP_GAMES_LIMIT`] long.
///
/// # Errors
///
/// [`GameErr::NoData`] is only raised when the stream sweep saw no games at all. If every
/// candidate is later dropped for missing metadata the result is an empty list, not an error.
pub async fn top_games(helix: &Helix, auth: &AuthHeaders) -> GameResult<Vec<RankedGame>> {
    let aggregate = aggregate_viewers(helix, auth).await?;
    if aggregate.is_empty() {
        return Err(GameErr::NoData);
    }

    let ranked = rank(&aggregate, TOP_GAMES_LIMIT);
    let ids: Vec<String> = ranked.iter().map(|(id, _)| id.clone()).collect();
    let metadata = enrich_games(helix, auth, &ids).await?;

    let candidate_count = ranked.len();
    let games = join_metadata(ranked, metadata);

    if games.len() < candidate_count {
        tracing::warn!(
            dropped = candidate_count - games.len(),
            "dropped games with no helix metadata"
        );
    }

    tracing::debug!(game_count = games.len(), "ranked top games");
    Ok(games)
}

/// Orders the aggregate by viewers descending, breaking ties by ascending game id, and keeps the
/// first `limit` entries.
pub fn rank(aggregate: &GameAggregate, limit: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = aggregate
        .iter()
        .map(|(id, viewers)| (id.clone(), *viewers))
        .collect();

    entries.sort_unstable_by(|(a_id, a_viewers), (b_id, b_viewers)| {
        b_viewers.cmp(a_viewers).then_with(|| a_id.cmp(b_id))
    });
    entries.truncate(limit);

    entries
}

/// Pairs ranked ids with their metadata, preserving order. Ids without metadata are dropped.
pub fn join_metadata(
    ranked: Vec<(String, u64)>,
    mut metadata: HashMap<String, HelixGame>,
) -> Vec<RankedGame> {
    ranked
        .into_iter()
        .filter_map(|(id, viewers)| {
            metadata.remove(&id).map(|game| RankedGame {
                id: game.id,
                name: game.name,
                box_art_url: game.box_art_url,
                viewers,
            })
        })
        .collect()
}
