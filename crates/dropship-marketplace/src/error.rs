use thiserror::Error;

/// eBay error id returned when an offer already exists for the SKU.
pub const OFFER_EXISTS_ERROR_ID: i64 = 25002;

/// Errors returned by the marketplace API client.
#[derive(Debug, Error)]
pub enum MarketplaceError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response. `body` is the response text, truncated.
    #[error("marketplace returned HTTP {status} for {context}: {body}")]
    Status {
        status: u16,
        context: String,
        body: String,
    },

    /// An offer already exists for this SKU (HTTP 409 or error id 25002).
    #[error("offer already exists for sku {sku}")]
    OfferExists { sku: String },

    /// A 2xx response lacked a field the workflow depends on.
    #[error("marketplace response for {context} is missing {field}")]
    MissingField {
        context: String,
        field: &'static str,
    },

    /// A 2xx response carried a value the workflow cannot use.
    #[error("marketplace response for {context} has unusable {field}: {value}")]
    InvalidField {
        context: String,
        field: &'static str,
        value: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid marketplace base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl MarketplaceError {
    /// Returns `true` for failures worth retrying after a back-off delay:
    /// timeouts, connection failures, HTTP 429 and HTTP 5xx.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            MarketplaceError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            MarketplaceError::Status { status, .. } => *status == 429 || *status >= 500,
            MarketplaceError::OfferExists { .. }
            | MarketplaceError::MissingField { .. }
            | MarketplaceError::InvalidField { .. }
            | MarketplaceError::Deserialize { .. }
            | MarketplaceError::InvalidBaseUrl { .. } => false,
        }
    }

    /// HTTP status of a rejected request, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            MarketplaceError::Status { status, .. } => Some(*status),
            MarketplaceError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
