use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupplierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by supplier (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("supplier product not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("normalization error for product {product_id}: {reason}")]
    Normalization { product_id: String, reason: String },

    #[error("invalid supplier base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl SupplierError {
    /// Returns `true` if the failure is a transient condition worth retrying.
    ///
    /// Transient: network failures and timeouts, HTTP 429, HTTP 5xx.
    /// Everything else (404, other 4xx, malformed bodies, normalization
    /// failures, bad configuration) fails the same way on every attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            SupplierError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            SupplierError::RateLimited { .. } => true,
            SupplierError::UnexpectedStatus { status, .. } => *status >= 500,
            SupplierError::Deserialize { .. }
            | SupplierError::NotFound { .. }
            | SupplierError::Normalization { .. }
            | SupplierError::InvalidBaseUrl { .. } => false,
        }
    }
}
