use core::fmt;

use http::header::{AUTHORIZATION, HeaderName, InvalidHeaderValue};
use http::{HeaderMap, HeaderValue, StatusCode};
use redact::Secret;
use serde::{Deserialize, Deserializer};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use crate::util::env::Env;
use crate::util::token::{AccessToken, TokenResponse};

pub const HELIX_URN_STREAMS: &str = "streams";
pub const HELIX_URN_GAMES: &str = "games";
pub const HEADER_CLIENT_ID: &str = "client-id";

/// Thin client over the Helix endpoints the game reads from.
///
/// Base URLs are held per-instance rather than baked in so the whole pipeline can be pointed at a
/// mock server.
#[derive(Debug, Clone)]
pub struct Helix {
    client: reqwest::Client,
    base_url: String,
    token_url: String,
}

impl Helix {
    pub fn new(base_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_url: token_url.into(),
        }
    }

    pub fn from_env(env: &Env) -> Self {
        Self::new(&env.helix_api_url, &env.twitch_token_url)
    }

    fn uri(&self, endpoint: HelixUri) -> String {
        format!("{}/{}", self.base_url, endpoint.urn())
    }

    #[instrument(skip(self, query, auth), fields(param_count = query.len()))]
    /// Performs a GET request against a Helix endpoint and parses the response according to the
    /// specified `T` output type.
    ///
    /// Any non-success status is returned as [`HelixErr::FetchErr`] carrying the response body.
    pub async fn get<T>(
        &self,
        endpoint: HelixUri,
        query: &[(&str, &str)],
        auth: &AuthHeaders,
    ) -> HelixResult<T>
    where
        T: DeserializeOwned + fmt::Debug,
    {
        let res = self
            .client
            .get(self.uri(endpoint))
            .headers(auth.bearer.clone())
            .query(query)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            tracing::error!(code = %status, body, "non-success response from helix");

            return Err(HelixErr::FetchErr { status, body });
        }

        // log rate limit
        let rl_remaining = res.headers().get("ratelimit-remaining");
        let rl_total = res.headers().get("ratelimit-limit");

        if let Some(remaining) = rl_remaining
            && let Some(total) = rl_total
        {
            tracing::debug!(ratelimit_available = ?remaining, ratelimit_total = ?total, "rate-limit bucket");
        }

        Ok(res.json::<T>().await?)
    }

    #[instrument(skip(self, client_secret))]
    /// Exchanges app credentials for an access token via the client-credentials grant.
    pub async fn request_app_token(
        &self,
        client_id: &str,
        client_secret: &Secret<String>,
    ) -> HelixResult<TokenResponse> {
        let form = [
            ("client_id", client_id),
            ("client_secret", client_secret.expose_secret().as_str()),
            ("grant_type", "client_credentials"),
        ];

        let res = self.client.post(&self.token_url).form(&form).send().await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            tracing::error!(code = %status, body, "token endpoint rejected app credentials");

            return Err(HelixErr::AuthErr { status, body });
        }

        Ok(res.json::<TokenResponse>().await?)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum HelixUri {
    Streams,
    Games,
}

impl HelixUri {
    pub fn urn(self) -> &'static str {
        match self {
            HelixUri::Streams => HELIX_URN_STREAMS,
            HelixUri::Games => HELIX_URN_GAMES,
        }
    }
}

/// Headers attached to every Helix request: the app token as a bearer credential plus the
/// `Client-Id` it was issued to.
#[derive(Debug, Clone)]
pub struct AuthHeaders {
    bearer: HeaderMap,
}

impl AuthHeaders {
    pub fn new(token: &AccessToken, client_id: &str) -> HelixResult<Self> {
        let client_id = HeaderValue::from_str(client_id)?;
        let mut bearer_value = HeaderValue::from_str(&format!("Bearer {}", token.secret()))?;
        bearer_value.set_sensitive(true);

        let mut bearer = HeaderMap::new();
        bearer.insert(AUTHORIZATION, bearer_value);
        bearer.insert(HeaderName::from_static(HEADER_CLIENT_ID), client_id);

        Ok(Self { bearer })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct HelixDataResponse<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<HelixPagination>,
}

impl<T> HelixDataResponse<T> {
    /// The cursor for the next page, if helix reported one. An empty cursor means the same as
    /// no cursor.
    pub fn cursor(&self) -> Option<&str> {
        self.pagination
            .as_ref()
            .and_then(|p| p.cursor.as_deref())
            .filter(|c| !c.is_empty())
    }
}

/// Helix occasionally sends `"data": null` where it means an empty list
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HelixPagination {
    #[serde(default)]
    pub cursor: Option<String>,
}

/// An entry from `/helix/streams`.
///
/// Every field is defaulted as the listing and per-game queries are read for different subsets of
/// the payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HelixStream {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_login: String,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub viewer_count: u64,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub title: String,
}

/// An entry from `/helix/games`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HelixGame {
    pub id: String,
    pub name: String,
    pub box_art_url: String,
}

pub type HelixResult<T> = core::result::Result<T, HelixErr>;

#[derive(Debug, Error)]
pub enum HelixErr {
    #[error("twitch api credentials are not configured (missing {0})")]
    Configuration(&'static str),

    #[error("failed to get twitch access token ({status}): {body}")]
    AuthErr { status: StatusCode, body: String },

    #[error("failed to fetch from twitch ({status}): {body}")]
    FetchErr { status: StatusCode, body: String },

    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("while creating a HeaderValue ({0})")]
    HeaderError(#[from] InvalidHeaderValue),
}
