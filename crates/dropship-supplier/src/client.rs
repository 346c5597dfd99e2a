//! HTTP client for the supplier product-detail endpoint.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::SupplierError;
use crate::types::RawSupplierProduct;

/// HTTP client for the supplier catalog.
///
/// Fetches one product per call and returns the body untouched; callers
/// normalize it with [`crate::normalize_product`]. Retries are the caller's
/// concern: every non-2xx status surfaces as a typed error.
pub struct AliExpressClient {
    client: Client,
    base_url: Url,
    app_key: Option<String>,
}

impl AliExpressClient {
    /// Creates a client with the given request timeout.
    ///
    /// `app_key`, when present, is sent as a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SupplierError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        app_key: Option<&str>,
    ) -> Result<Self, SupplierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("dropship-sync/0.1 (catalog-import)")
            .build()?;

        // Exactly one trailing slash so `Url::join` appends instead of
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SupplierError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            app_key: app_key.map(str::to_owned),
        })
    }

    /// Fetches the raw product-detail document for `product_id`.
    ///
    /// # Errors
    ///
    /// - [`SupplierError::RateLimited`] on HTTP 429.
    /// - [`SupplierError::NotFound`] on HTTP 404.
    /// - [`SupplierError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`SupplierError::Http`] on network failure or timeout.
    /// - [`SupplierError::Deserialize`] if the body is not JSON.
    pub async fn fetch_product(&self, product_id: &str) -> Result<RawSupplierProduct, SupplierError> {
        let url = self.product_url(product_id)?;
        tracing::debug!(product_id, %url, "fetching supplier product");

        let mut request = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(key) = &self.app_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(SupplierError::RateLimited { retry_after_secs });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SupplierError::NotFound {
                url: url.to_string(),
            });
        }

        if !status.is_success() {
            return Err(SupplierError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let body = serde_json::from_str(&body).map_err(|e| SupplierError::Deserialize {
            context: format!("product {product_id}"),
            source: e,
        })?;

        Ok(RawSupplierProduct {
            requested_id: product_id.to_owned(),
            body,
        })
    }

    fn product_url(&self, product_id: &str) -> Result<Url, SupplierError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SupplierError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .push("product")
            .push(product_id);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_url_appends_segments() {
        let client = AliExpressClient::new("https://supplier.test/api", 5, None).unwrap();
        let url = client.product_url("123456").unwrap();
        assert_eq!(url.as_str(), "https://supplier.test/api/product/123456");
    }

    #[test]
    fn product_url_strips_trailing_slash() {
        let client = AliExpressClient::new("https://supplier.test/", 5, None).unwrap();
        let url = client.product_url("1").unwrap();
        assert_eq!(url.as_str(), "https://supplier.test/product/1");
    }

    #[test]
    fn product_url_encodes_id() {
        let client = AliExpressClient::new("https://supplier.test", 5, None).unwrap();
        let url = client.product_url("a/b").unwrap();
        assert_eq!(url.as_str(), "https://supplier.test/product/a%2Fb");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = AliExpressClient::new("not a url", 5, None);
        assert!(matches!(result, Err(SupplierError::InvalidBaseUrl { .. })));
    }
}
