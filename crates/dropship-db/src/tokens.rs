//! Durable storage for the marketplace access token.
//!
//! One row per provider. Keeping the token across restarts avoids a
//! credential exchange every time a CLI command runs.

use chrono::{DateTime, Utc};
use dropship_core::AuthToken;
use sqlx::PgPool;

use crate::DbError;

/// Provider key for the marketplace application token.
pub const MARKETPLACE_TOKEN_PROVIDER: &str = "ebay";

/// Loads the stored token for `provider`, if any.
///
/// Expired tokens are returned as-is; the caller decides whether to use them.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_token(pool: &PgPool, provider: &str) -> Result<Option<AuthToken>, DbError> {
    let row = sqlx::query_as::<_, (String, DateTime<Utc>)>(
        "SELECT access_token, expires_at FROM marketplace_tokens WHERE provider = $1",
    )
    .bind(provider)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(value, expires_at)| AuthToken { value, expires_at }))
}

/// Stores `token` for `provider`, replacing any previous one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn save_token(pool: &PgPool, provider: &str, token: &AuthToken) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO marketplace_tokens (provider, access_token, expires_at) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (provider) DO UPDATE SET \
             access_token = EXCLUDED.access_token, \
             expires_at   = EXCLUDED.expires_at, \
             updated_at   = NOW()",
    )
    .bind(provider)
    .bind(&token.value)
    .bind(token.expires_at)
    .execute(pool)
    .await?;

    Ok(())
}
