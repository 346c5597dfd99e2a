use std::net::SocketAddr;

use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which marketplace deployment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketplaceEnv {
    Sandbox,
    Production,
}

impl MarketplaceEnv {
    /// REST root for this deployment, without a trailing slash.
    #[must_use]
    pub fn api_root(self) -> &'static str {
        match self {
            MarketplaceEnv::Sandbox => "https://api.sandbox.ebay.com",
            MarketplaceEnv::Production => "https://api.ebay.com",
        }
    }
}

impl std::fmt::Display for MarketplaceEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketplaceEnv::Sandbox => write!(f, "sandbox"),
            MarketplaceEnv::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,

    pub marketplace_env: MarketplaceEnv,
    /// Marketplace REST root. Defaults to [`MarketplaceEnv::api_root`] and is
    /// overridable so the clients can be pointed at a local mock.
    pub marketplace_base_url: String,
    pub marketplace_client_id: String,
    pub marketplace_client_secret: String,
    pub marketplace_id: String,
    pub currency: String,
    pub marketplace_scopes: Vec<String>,

    pub supplier_base_url: String,
    pub supplier_app_key: Option<String>,
    pub supplier_app_secret: Option<String>,
    pub affiliate_enabled: bool,
    pub affiliate_tracking_id: Option<String>,
    pub affiliate_sub_id: Option<String>,

    pub markup_percent: Decimal,
    pub sku_prefix: String,
    pub max_retries: u32,
    pub retry_backoff_secs: u64,
    pub http_timeout_secs: u64,
    pub token_safety_margin_secs: u64,
    pub sync_cron: String,
    pub sync_max_concurrent: usize,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("marketplace_env", &self.marketplace_env)
            .field("marketplace_base_url", &self.marketplace_base_url)
            .field("marketplace_client_id", &self.marketplace_client_id)
            .field("marketplace_client_secret", &"[redacted]")
            .field("marketplace_id", &self.marketplace_id)
            .field("currency", &self.currency)
            .field("marketplace_scopes", &self.marketplace_scopes)
            .field("supplier_base_url", &self.supplier_base_url)
            .field(
                "supplier_app_key",
                &self.supplier_app_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "supplier_app_secret",
                &self.supplier_app_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("affiliate_enabled", &self.affiliate_enabled)
            .field("affiliate_tracking_id", &self.affiliate_tracking_id)
            .field("affiliate_sub_id", &self.affiliate_sub_id)
            .field("markup_percent", &self.markup_percent)
            .field("sku_prefix", &self.sku_prefix)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_secs", &self.retry_backoff_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("token_safety_margin_secs", &self.token_safety_margin_secs)
            .field("sync_cron", &self.sync_cron)
            .field("sync_max_concurrent", &self.sync_max_concurrent)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
