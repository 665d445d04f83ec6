use std::time::Duration;

use redact::Secret;
use serde::Deserialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::instrument;

use crate::constants::TOKEN_REFRESH_MARGIN_SECS;
use crate::util::env::Env;
use crate::util::helix::{AuthHeaders, Helix, HelixErr, HelixResult};

/// An app access token. Only ever exposed when building request headers.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken(Secret<String>);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Secret::new(value.into()))
    }

    pub fn secret(&self) -> &str {
        self.0.expose_secret()
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: AccessToken,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppToken {
    pub token: AccessToken,
    pub expires_in: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPolicy {
    /// Every call performs a fresh client-credentials exchange
    Fresh,
    /// Tokens are reused until shortly before their reported expiry
    Cached,
}

#[derive(Debug)]
struct CachedToken {
    token: AccessToken,
    expires_at: Instant,
}

impl CachedToken {
    fn valid_token(&self) -> Option<AccessToken> {
        let margin = Duration::from_secs(TOKEN_REFRESH_MARGIN_SECS);
        (Instant::now() + margin < self.expires_at).then(|| self.token.clone())
    }
}

/// Issues app access tokens for Helix requests.
///
/// Credentials are checked on every call rather than at construction, so a server started without
/// them keeps running and reports a configuration error per request.
#[derive(Debug)]
pub struct TokenProvider {
    client_id: Option<String>,
    client_secret: Option<Secret<String>>,
    policy: TokenPolicy,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<Secret<String>>,
        policy: TokenPolicy,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            policy,
            cached: RwLock::new(None),
        }
    }

    pub fn from_env(env: &Env) -> Self {
        let policy = match env.twitch_token_cache {
            true => TokenPolicy::Cached,
            false => TokenPolicy::Fresh,
        };

        Self::new(
            env.twitch_client_id.clone(),
            env.twitch_client_secret.clone(),
            policy,
        )
    }

    fn credentials(&self) -> HelixResult<(&str, &Secret<String>)> {
        let client_id = self
            .client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(HelixErr::Configuration("TWITCH_CLIENT_ID"))?;

        let client_secret = self
            .client_secret
            .as_ref()
            .filter(|secret| !secret.expose_secret().is_empty())
            .ok_or(HelixErr::Configuration("TWITCH_CLIENT_SECRET"))?;

        Ok((client_id, client_secret))
    }

    #[instrument(skip(self, helix))]
    /// Performs a single client-credentials exchange. Never consults or fills the cache.
    pub async fn fetch_access_token(&self, helix: &Helix) -> HelixResult<AppToken> {
        let (client_id, client_secret) = self.credentials()?;
        let res = helix.request_app_token(client_id, client_secret).await?;

        tracing::debug!(expires_in = ?res.expires_in, "fetched app access token");
        Ok(AppToken {
            token: res.access_token,
            expires_in: res.expires_in.map(Duration::from_secs),
        })
    }

    #[instrument(skip(self, helix), fields(policy = ?self.policy))]
    /// Builds the headers for a pipeline run, reusing a cached token when the policy allows it.
    pub async fn auth_headers(&self, helix: &Helix) -> HelixResult<AuthHeaders> {
        let (client_id, _) = self.credentials()?;
        let token = self.access_token(helix).await?;

        AuthHeaders::new(&token, client_id)
    }

    async fn access_token(&self, helix: &Helix) -> HelixResult<AccessToken> {
        if self.policy == TokenPolicy::Fresh {
            return Ok(self.fetch_access_token(helix).await?.token);
        }

        if let Some(token) = self.cached.read().await.as_ref().and_then(CachedToken::valid_token) {
            tracing::trace!("reusing cached app token");
            return Ok(token);
        }

        let mut cached = self.cached.write().await;

        // a concurrent request may have refreshed the token while we waited for the write lock
        if let Some(token) = cached.as_ref().and_then(CachedToken::valid_token) {
            return Ok(token);
        }

        let fetched = self.fetch_access_token(helix).await?;
        *cached = fetched.expires_in.map(|ttl| CachedToken {
            token: fetched.token.clone(),
            expires_at: Instant::now() + ttl,
        });

        Ok(fetched.token)
    }
}
