use serde::Serialize;
use tracing::instrument;

use crate::constants::{THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};
use crate::games::sample::render_image_url;
use crate::util::helix::{AuthHeaders, Helix, HelixDataResponse, HelixResult, HelixStream, HelixUri};

/// A live stream shown for a game, thumbnail already rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamDetail {
    pub id: String,
    pub user_name: String,
    pub user_login: String,
    pub viewer_count: u64,
    pub thumbnail_url: String,
    pub title: String,
}

impl From<HelixStream> for StreamDetail {
    fn from(stream: HelixStream) -> Self {
        Self {
            thumbnail_url: render_image_url(
                &stream.thumbnail_url,
                THUMBNAIL_WIDTH,
                THUMBNAIL_HEIGHT,
            ),
            id: stream.id,
            user_name: stream.user_name,
            user_login: stream.user_login,
            viewer_count: stream.viewer_count,
            title: stream.title,
        }
    }
}

#[instrument(skip(helix, auth))]
/// Fetches the most-watched live streams for a single game in one request.
///
/// A game with nobody live yields an empty list.
pub async fn top_streams_for_game(
    helix: &Helix,
    auth: &AuthHeaders,
    game_id: &str,
    limit: usize,
) -> HelixResult<Vec<StreamDetail>> {
    let first = limit.to_string();
    let res: HelixDataResponse<HelixStream> = helix
        .get(
            HelixUri::Streams,
            &[("game_id", game_id), ("first", first.as_str())],
            auth,
        )
        .await?;

    tracing::debug!(stream_count = res.data.len(), "fetched streams for game");
    Ok(res
        .data
        .into_iter()
        .take(limit)
        .map(StreamDetail::from)
        .collect())
}
