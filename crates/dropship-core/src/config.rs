use std::str::FromStr;

use rust_decimal::Decimal;

use crate::app_config::{AppConfig, Environment, MarketplaceEnv};
use crate::ConfigError;

const DEFAULT_SCOPES: &str = "https://api.ebay.com/oauth/api_scope/sell.inventory \
     https://api.ebay.com/oauth/api_scope/sell.fulfillment \
     https://api.ebay.com/oauth/api_scope/sell.account";

const DEFAULT_SUPPLIER_BASE_URL: &str = "https://api.aliexpress.com";

/// Largest accepted `DROPSHIP_TOKEN_SAFETY_MARGIN_SECS` (one day).
pub const MAX_TOKEN_SAFETY_MARGIN_SECS: u64 = 86_400;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
///
/// # Errors
///
/// Returns `ConfigError` if required keys are missing or values are invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let marketplace_client_id = require("EBAY_CLIENT_ID")?;
    let marketplace_client_secret = require("EBAY_CLIENT_SECRET")?;

    let env = parse_environment(&or_default("DROPSHIP_ENV", "development"))?;
    let bind_addr = or_default("DROPSHIP_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("DROPSHIP_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("DROPSHIP_LOG_LEVEL", "info");

    let marketplace_env = parse_marketplace_env(&or_default("EBAY_ENV", "sandbox"))?;
    let marketplace_base_url = or_default("EBAY_API_BASE_URL", marketplace_env.api_root())
        .trim_end_matches('/')
        .to_string();
    let marketplace_id = or_default("EBAY_MARKETPLACE_ID", "EBAY_AU");
    let currency = or_default("EBAY_CURRENCY", "USD");
    let marketplace_scopes = parse_scopes(&or_default("EBAY_SCOPES", DEFAULT_SCOPES));
    if marketplace_scopes.is_empty() {
        return Err(invalid("EBAY_SCOPES", "at least one scope is required".into()));
    }

    let supplier_base_url = or_default("ALI_BASE_URL", DEFAULT_SUPPLIER_BASE_URL)
        .trim_end_matches('/')
        .to_string();
    let supplier_app_key = optional("ALI_APP_KEY");
    let supplier_app_secret = optional("ALI_APP_SECRET");
    let affiliate_enabled = parse_bool("DROPSHIP_AFFILIATE_ENABLED", "true")?;
    let affiliate_tracking_id = optional("ALI_AFF_TRACKING_ID");
    let affiliate_sub_id = optional("ALI_AFF_SUB_ID");

    let markup_percent = parse_markup(&or_default("DROPSHIP_MARKUP_PERCENT", "30"))?;
    let sku_prefix = or_default("DROPSHIP_SKU_PREFIX", "ALI");
    if sku_prefix.trim().is_empty() {
        return Err(invalid("DROPSHIP_SKU_PREFIX", "must not be empty".into()));
    }
    let max_retries = parse_u32("DROPSHIP_MAX_RETRIES", "3")?;
    let retry_backoff_secs = parse_u64("DROPSHIP_RETRY_BACKOFF_SECS", "2")?;
    let http_timeout_secs = parse_u64("DROPSHIP_HTTP_TIMEOUT_SECS", "15")?;
    let token_safety_margin_secs = parse_u64("DROPSHIP_TOKEN_SAFETY_MARGIN_SECS", "60")?;
    if token_safety_margin_secs > MAX_TOKEN_SAFETY_MARGIN_SECS {
        return Err(invalid(
            "DROPSHIP_TOKEN_SAFETY_MARGIN_SECS",
            format!("must be at most {MAX_TOKEN_SAFETY_MARGIN_SECS}"),
        ));
    }
    let sync_cron = or_default("DROPSHIP_SYNC_CRON", "0 0 */6 * * *");
    let sync_max_concurrent = parse_usize("DROPSHIP_SYNC_MAX_CONCURRENT", "4")?;

    let db_max_connections = parse_u32("DROPSHIP_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("DROPSHIP_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("DROPSHIP_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        marketplace_env,
        marketplace_base_url,
        marketplace_client_id,
        marketplace_client_secret,
        marketplace_id,
        currency,
        marketplace_scopes,
        supplier_base_url,
        supplier_app_key,
        supplier_app_secret,
        affiliate_enabled,
        affiliate_tracking_id,
        affiliate_sub_id,
        markup_percent,
        sku_prefix,
        max_retries,
        retry_backoff_secs,
        http_timeout_secs,
        token_safety_margin_secs,
        sync_cron,
        sync_max_concurrent,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "DROPSHIP_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_marketplace_env(s: &str) -> Result<MarketplaceEnv, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "sandbox" => Ok(MarketplaceEnv::Sandbox),
        "production" | "prod" => Ok(MarketplaceEnv::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "EBAY_ENV".to_string(),
            reason: format!("expected \"sandbox\" or \"production\", got \"{other}\""),
        }),
    }
}

fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_owned).collect()
}

fn parse_markup(raw: &str) -> Result<Decimal, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "DROPSHIP_MARKUP_PERCENT".to_string(),
        reason,
    };
    let value = Decimal::from_str(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if value.is_sign_negative() {
        return Err(invalid("markup must not be negative".into()));
    }
    Ok(value)
}
