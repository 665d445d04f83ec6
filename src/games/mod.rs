//! The higher-or-lower candidate pipeline.
//!
//! A pipeline run sweeps the live-stream listing into per-game viewer totals, ranks the totals,
//! resolves display metadata for the top entries and draws two distinct games from the result.

use thiserror::Error;
use tracing::instrument;

use crate::constants::SPOTLIGHT_LIMIT;
use crate::util::helix::{Helix, HelixErr};
use crate::util::token::TokenProvider;

pub mod aggregate;
pub mod enrich;
pub mod rank;
pub mod sample;
pub mod spotlight;

pub mod prelude {
    pub use crate::games::sample::GamePair;
    pub use crate::games::spotlight::StreamDetail;
    pub use crate::games::{random_game_pair, top_streams};
}

use rank::top_games;
use sample::{GamePair, game_pair};
use spotlight::{StreamDetail, top_streams_for_game};

#[instrument(skip(helix, tokens))]
/// Picks two distinct games from the current most-watched list.
pub async fn random_game_pair(helix: &Helix, tokens: &TokenProvider) -> GameResult<GamePair> {
    let auth = tokens.auth_headers(helix).await?;
    let games = top_games(helix, &auth).await?;

    let pair = game_pair(&games, &mut rand::rng())?;
    tracing::info!(
        game1 = %pair.game1.name,
        game2 = %pair.game2.name,
        "sampled game pair"
    );

    Ok(pair)
}

#[instrument(skip(helix, tokens))]
/// The top live streams for `game_id`, capped at [`SPOTLIGHT_LIMIT`].
pub async fn top_streams(
    helix: &Helix,
    tokens: &TokenProvider,
    game_id: &str,
) -> GameResult<Vec<StreamDetail>> {
    let auth = tokens.auth_headers(helix).await?;
    Ok(top_streams_for_game(helix, &auth, game_id, SPOTLIGHT_LIMIT).await?)
}

pub type GameResult<T> = core::result::Result<T, GameErr>;

#[derive(Debug, Error)]
pub enum GameErr {
    #[error(transparent)]
    Helix(#[from] HelixErr),

    #[error("no games with viewers found")]
    NoData,

    #[error("not enough games returned from twitch (found {found}, need 2)")]
    InsufficientCandidates { found: usize },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::testing::{game, mock_helix, mock_tokens, mount_token, page, stream};
    use crate::util::token::TokenPolicy;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_pipeline(server: &MockServer, games: Vec<serde_json::Value>) {
        Mock::given(method("GET"))
            .and(path("/helix/streams"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                vec![stream("A", 300), stream("A", 200), stream("B", 100), stream("C", 50)],
                None,
            )))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/helix/games"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": games })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_random_game_pair() {
        let server = MockServer::start().await;
        mount_token(&server, Some(3600), 1).await;
        mount_pipeline(
            &server,
            vec![game("A", "Game A"), game("B", "Game B"), game("C", "Game C")],
        )
        .await;

        let pair = random_game_pair(&mock_helix(&server), &mock_tokens())
            .await
            .unwrap();

        assert_ne!(pair.game1.id, pair.game2.id);
        for card in [&pair.game1, &pair.game2] {
            let expected_viewers = match card.id.as_str() {
                "A" => 500,
                "B" => 100,
                "C" => 50,
                other => panic!("unexpected game {other}"),
            };
            assert_eq!(card.viewers, expected_viewers);
            assert_eq!(card.image, format!("https://art/{}-272x380.jpg", card.id));
        }
    }

    #[tokio::test]
    async fn test_pair_fails_when_enrichment_drops_everything() {
        let server = MockServer::start().await;
        mount_token(&server, Some(3600), 1).await;
        mount_pipeline(&server, vec![]).await;

        let err = random_game_pair(&mock_helix(&server), &mock_tokens())
            .await
            .unwrap_err();

        assert!(matches!(err, GameErr::InsufficientCandidates { found: 0 }));
    }

    #[tokio::test]
    async fn test_pair_with_single_game() {
        let server = MockServer::start().await;
        mount_token(&server, Some(3600), 1).await;
        mount_pipeline(&server, vec![game("A", "Game A")]).await;

        let err = random_game_pair(&mock_helix(&server), &mock_tokens())
            .await
            .unwrap_err();

        assert!(matches!(err, GameErr::InsufficientCandidates { found: 1 }));
    }

    #[tokio::test]
    async fn test_missing_credentials_never_reach_helix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let tokens = TokenProvider::new(None, None, TokenPolicy::Fresh);
        let err = top_streams(&mock_helix(&server), &tokens, "1")
            .await
            .unwrap_err();

        assert!(matches!(err, GameErr::Helix(HelixErr::Configuration(_))));
    }

    #[tokio::test]
    async fn test_top_streams() {
        let server = MockServer::start().await;
        mount_token(&server, Some(3600), 1).await;
        Mock::given(method("GET"))
            .and(path("/helix/streams"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page(vec![stream("A", 12)], None)),
            )
            .mount(&server)
            .await;

        let streams = top_streams(&mock_helix(&server), &mock_tokens(), "A")
            .await
            .unwrap();

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].thumbnail_url, "https://thumbs/live_400x225.jpg");
    }
}
