pub mod app_config;
pub mod config;
pub mod listing;
pub mod products;
pub mod records;

pub use app_config::{AppConfig, Environment, MarketplaceEnv};
pub use config::{
    build_app_config, load_app_config, load_app_config_from_env, MAX_TOKEN_SAFETY_MARGIN_SECS,
};
pub use listing::ListingPayload;
pub use products::CanonicalProduct;
pub use records::{AuthToken, SyncRecord};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
