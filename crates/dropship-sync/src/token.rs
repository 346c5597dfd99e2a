//! Lazily refreshed marketplace access token.
//!
//! States: no token, valid, expiring (inside the safety margin). A caller
//! asking for a token while none is held or the held one is expiring
//! triggers a client-credentials exchange; there is no background refresh.
//! The check and the refresh happen under one lock, so concurrent callers
//! never exchange twice for the same expiry.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use dropship_core::{AppConfig, AuthToken, MAX_TOKEN_SAFETY_MARGIN_SECS};
use dropship_marketplace::MarketplaceError;
use tokio::sync::Mutex;

use crate::capabilities::{TokenExchange, TokenStore};
use crate::error::SyncError;
use crate::retry::{retry_with_backoff, RetryPolicy};

#[derive(Clone)]
pub struct TokenSettings {
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
    pub safety_margin: chrono::Duration,
}

impl TokenSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            client_id: config.marketplace_client_id.clone(),
            client_secret: config.marketplace_client_secret.clone(),
            scopes: config.marketplace_scopes.clone(),
            safety_margin: safety_margin(config.token_safety_margin_secs),
        }
    }
}

/// Margins above [`MAX_TOKEN_SAFETY_MARGIN_SECS`] are clamped to it.
fn safety_margin(secs: u64) -> TimeDelta {
    let secs = secs.min(MAX_TOKEN_SAFETY_MARGIN_SECS);
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::zero())
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("scopes", &self.scopes)
            .field("safety_margin", &self.safety_margin)
            .finish()
    }
}

pub struct TokenManager<X, T> {
    exchange: Arc<X>,
    store: T,
    settings: TokenSettings,
    retry: RetryPolicy,
    cached: Mutex<Option<AuthToken>>,
}

impl<X, T> TokenManager<X, T>
where
    X: TokenExchange,
    T: TokenStore,
{
    pub fn new(exchange: Arc<X>, store: T, settings: TokenSettings, retry: RetryPolicy) -> Self {
        Self {
            exchange,
            store,
            settings,
            retry,
            cached: Mutex::new(None),
        }
    }

    /// `true` when no token is held or the held one is inside the safety
    /// margin of its expiry.
    pub async fn needs_token(&self) -> bool {
        let cached = self.cached.lock().await;
        self.is_unusable(cached.as_ref())
    }

    /// Loads a previously persisted token so a restarted process can reuse
    /// it. Returns `true` when a usable token was restored.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Persistence`] if the store cannot be read.
    pub async fn restore(&self) -> Result<bool, SyncError> {
        let stored = self.store.load_token().await?;
        let mut cached = self.cached.lock().await;
        match stored {
            Some(token) if !self.is_unusable(Some(&token)) => {
                tracing::debug!(expires_at = %token.expires_at, "restored marketplace token");
                *cached = Some(token);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Exchanges client credentials for a new token with the given scopes,
    /// persists and caches it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Auth`] when the exchange fails after retries.
    pub async fn obtain_token(&self, scopes: &[String]) -> Result<AuthToken, SyncError> {
        let mut cached = self.cached.lock().await;
        let token = self.exchange(scopes).await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Returns a token value that is valid beyond the safety margin,
    /// exchanging for a new one first when needed.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Auth`] when a needed exchange fails.
    pub async fn access_token(&self) -> Result<String, SyncError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| !self.is_unusable(Some(*t))) {
            return Ok(token.value.clone());
        }

        let token = self.exchange(&self.settings.scopes).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drops the cached token; the next [`Self::access_token`] exchanges anew.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    fn is_unusable(&self, token: Option<&AuthToken>) -> bool {
        token.is_none_or(|t| t.needs_refresh(Utc::now(), self.settings.safety_margin))
    }

    async fn exchange(&self, scopes: &[String]) -> Result<AuthToken, SyncError> {
        tracing::info!("requesting marketplace application token");
        let response = retry_with_backoff(&self.retry, "token exchange", || {
            self.exchange.request_token(
                &self.settings.client_id,
                &self.settings.client_secret,
                scopes,
            )
        })
        .await
        .map_err(SyncError::auth)?;

        let token = AuthToken::issued_at(response.access_token, Utc::now(), response.expires_in)
            .ok_or_else(|| SyncError::Auth {
                attempts: 1,
                source: MarketplaceError::InvalidField {
                    context: "token exchange".to_string(),
                    field: "expires_in",
                    value: response.expires_in.to_string(),
                },
            })?;
        tracing::info!(
            expires_in = response.expires_in,
            expires_at = %token.expires_at,
            "obtained marketplace token"
        );

        // The cached copy stays authoritative; a failed write only costs an
        // extra exchange after the next restart.
        if let Err(err) = self.store.save_token(&token).await {
            tracing::warn!(error = %err, "failed to persist marketplace token");
        }
        Ok(token)
    }
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
