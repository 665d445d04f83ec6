use std::collections::HashMap;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::instrument;

use crate::constants::{GAMES_BATCH_SIZE, MAX_CONCURRENT_BATCHES};
use crate::util::helix::{AuthHeaders, Helix, HelixDataResponse, HelixGame, HelixResult, HelixUri};

#[instrument(skip(helix, auth, ids), fields(id_count = ids.len()))]
/// Resolves game ids to their display metadata, at most [`GAMES_BATCH_SIZE`] ids per request.
///
/// Batches are issued concurrently and must all succeed; the first failure fails the whole lookup.
/// Ids helix doesn't know about are simply absent from the returned map.
pub async fn enrich_games(
    helix: &Helix,
    auth: &AuthHeaders,
    ids: &[String],
) -> HelixResult<HashMap<String, HelixGame>> {
    let batches: Vec<Vec<String>> = ids
        .chunks(GAMES_BATCH_SIZE)
        .map(<[String]>::to_vec)
        .collect();
    tracing::debug!(batch_count = batches.len(), "resolving game metadata");

    let responses: Vec<HelixDataResponse<HelixGame>> = stream::iter(batches)
        .map(|batch| fetch_batch(helix, auth, batch))
        .buffer_unordered(MAX_CONCURRENT_BATCHES)
        .try_collect()
        .await?;

    let games: HashMap<String, HelixGame> = responses
        .into_iter()
        .flat_map(|res| res.data)
        .map(|game| (game.id.clone(), game))
        .collect();

    tracing::debug!(resolved_count = games.len(), "resolved game metadata");
    Ok(games)
}

async fn fetch_batch(
    helix: &Helix,
    auth: &AuthHeaders,
    batch: Vec<String>,
) -> HelixResult<HelixDataResponse<HelixGame>> {
    let query: Vec<(&str, &str)> = batch.iter().map(|id| ("id", id.as_str())).collect();
    helix.get(HelixUri::Games, &query, auth).await
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::helix::HelixErr;
    use crate::util::testing::{game, mock_auth, mock_helix};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ids(count: usize) -> Vec<String> {
        (0..count).map(|i| i.to_string()).collect()
    }

    #[tokio::test]
    async fn test_batches_by_hundred() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/helix/games"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .expect(2)
            .mount(&server)
            .await;

        enrich_games(&mock_helix(&server), &mock_auth(), &ids(150))
            .await
            .unwrap();

        let mut batch_sizes: Vec<usize> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|req| req.url.query_pairs().filter(|(k, _)| k == "id").count())
            .collect();
        batch_sizes.sort();

        assert_eq!(batch_sizes, vec![50, 100]);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/helix/games"))
            .and(query_param("id", "1"))
            .and(query_param("id", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": [game("1", "Just Chatting")] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let games = enrich_games(
            &mock_helix(&server),
            &mock_auth(),
            &["1".to_string(), "2".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(games.len(), 1);
        assert_eq!(games["1"].name, "Just Chatting");
        assert!(!games.contains_key("2"));
    }

    #[tokio::test]
    async fn test_no_ids_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let games = enrich_games(&mock_helix(&server), &mock_auth(), &[])
            .await
            .unwrap();
        assert!(games.is_empty());
    }

    #[tokio::test]
    async fn test_failed_batch_fails_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/helix/games"))
            .and(query_param("id", "0"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": [game("0", "Chess")] })),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/helix/games"))
            .and(query_param("id", "100"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = enrich_games(&mock_helix(&server), &mock_auth(), &ids(150))
            .await
            .unwrap_err();

        assert!(matches!(err, HelixErr::FetchErr { .. }));
    }
}
