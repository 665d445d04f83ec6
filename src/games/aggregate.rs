use std::collections::HashMap;

use tracing::instrument;

use crate::constants::{MAX_STREAM_PAGES, STREAMS_PAGE_SIZE};
use crate::util::helix::{AuthHeaders, Helix, HelixDataResponse, HelixResult, HelixStream, HelixUri};

/// Summed viewer counts keyed by game id
pub type GameAggregate = HashMap<String, u64>;

#[instrument(skip(helix, auth))]
/// Sweeps the live-stream listing and totals viewers per game.
///
/// Pages are requested strictly in sequence, following the cursor from each response, and the
/// sweep stops after [`MAX_STREAM_PAGES`] pages whether or not helix reports more. Any failed page
/// aborts the sweep and the partial totals are discarded.
pub async fn aggregate_viewers(helix: &Helix, auth: &AuthHeaders) -> HelixResult<GameAggregate> {
    let mut totals = GameAggregate::new();
    let mut cursor: Option<String> = None;
    let page_size = STREAMS_PAGE_SIZE.to_string();

    for page in 0..MAX_STREAM_PAGES {
        let res: HelixDataResponse<HelixStream> = {
            let mut query = vec![("first", page_size.as_str())];
            if let Some(after) = cursor.as_deref() {
                query.push(("after", after));
            }

            helix.get(HelixUri::Streams, &query, auth).await?
        };

        accumulate(&mut totals, &res.data);
        cursor = res.cursor().map(str::to_owned);

        tracing::debug!(
            page,
            stream_count = res.data.len(),
            game_count = totals.len(),
            cursor_present = cursor.is_some(),
            "aggregated stream page"
        );

        if cursor.is_none() {
            break;
        }
    }

    Ok(totals)
}

/// Adds each stream's viewers to its game's running total. Streams without a game are skipped.
pub fn accumulate(totals: &mut GameAggregate, streams: &[HelixStream]) {
    for stream in streams {
        if let Some(game_id) = stream.game_id.as_deref().filter(|id| !id.is_empty()) {
            *totals.entry(game_id.to_string()).or_default() += stream.viewer_count;
        }
    }
}
