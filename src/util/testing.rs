//! Shared fixtures for tests that talk to a mocked Helix.

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::util::helix::{AuthHeaders, Helix};
use crate::util::token::{AccessToken, TokenPolicy, TokenProvider};

/// A `Helix` client with both base URLs pointed at `server`
pub fn mock_helix(server: &MockServer) -> Helix {
    Helix::new(
        format!("{}/helix", server.uri()),
        format!("{}/oauth2/token", server.uri()),
    )
}

pub fn mock_auth() -> AuthHeaders {
    AuthHeaders::new(&AccessToken::new("test-token"), "test-client").unwrap()
}

pub fn mock_tokens() -> TokenProvider {
    TokenProvider::new(
        Some("test-client".to_string()),
        Some(redact::Secret::new("test-secret".to_string())),
        TokenPolicy::Fresh,
    )
}

/// Mounts a token endpoint that must be hit exactly `times` times
pub async fn mount_token(server: &MockServer, expires_in: Option<u64>, times: u64) {
    let mut body = json!({ "access_token": "test-token", "token_type": "bearer" });
    if let Some(secs) = expires_in {
        body["expires_in"] = json!(secs);
    }

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

pub fn stream(game_id: &str, viewers: u64) -> Value {
    json!({
        "id": format!("stream-{game_id}-{viewers}"),
        "user_name": "Someone",
        "user_login": "someone",
        "game_id": game_id,
        "viewer_count": viewers,
        "thumbnail_url": "https://thumbs/live_{width}x{height}.jpg",
        "title": "live now",
    })
}

pub fn game(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "box_art_url": format!("https://art/{id}-{{width}}x{{height}}.jpg"),
    })
}

pub fn page(data: Vec<Value>, cursor: Option<&str>) -> Value {
    match cursor {
        Some(cursor) => json!({ "data": data, "pagination": { "cursor": cursor } }),
        None => json!({ "data": data, "pagination": {} }),
    }
}
