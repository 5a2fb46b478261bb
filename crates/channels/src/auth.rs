//! OAuth password-grant tokens for a Reddit script app.

use crate::wire::TokenResponse;
use helperbot_core::error::PlatformError;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

/// Tokens are refreshed this long before Reddit says they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

pub struct TokenSource {
    token_url: String,
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
            cached: Mutex::new(None),
        }
    }

    /// A valid bearer token, fetching a new one when the cached one is
    /// close to expiry.
    pub async fn token(&self, client: &reqwest::Client) -> Result<String, PlatformError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let (value, expires_in) = self.fetch(client).await?;
        let lifetime = Duration::from_secs(expires_in).saturating_sub(REFRESH_MARGIN);
        info!(expires_in, "Obtained Reddit access token");
        *cached = Some(CachedToken {
            value: value.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    /// Drop the cached token so the next request fetches a fresh one.
    pub async fn invalidate(&self) {
        debug!("Invalidating Reddit access token");
        *self.cached.lock().await = None;
    }

    async fn fetch(&self, client: &reqwest::Client) -> Result<(String, u64), PlatformError> {
        let response = client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PlatformError::ConnectionLost(format!("token request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(PlatformError::Unauthorized(format!(
                "token endpoint rejected the app credentials ({status})"
            )));
        }
        if !status.is_success() {
            return Err(crate::reddit::status_error(status, "", response.headers()));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Malformed(format!("token response: {e}")))?;
        if let Some(error) = body.error {
            return Err(PlatformError::Unauthorized(format!("token grant failed: {error}")));
        }
        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PlatformError::Malformed("token response without access_token".into()))?;
        Ok((token, body.expires_in.unwrap_or(3_600)))
    }
}
