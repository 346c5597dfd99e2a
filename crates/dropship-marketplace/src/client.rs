//! HTTP client for the marketplace Sell and Identity APIs.
//!
//! Every call takes the bearer token explicitly; token lifetime is owned by
//! the caller. Non-2xx statuses surface as [`MarketplaceError::Status`] with
//! the response body attached, except for the "offer already exists" case,
//! which the publish workflow converges on and therefore gets its own variant.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::{MarketplaceError, OFFER_EXISTS_ERROR_ID};
use crate::types::{
    ApiErrorBody, BulkPriceQuantityRequest, BulkPriceQuantityResponse, CreateOfferResponse,
    InventoryItemRequest, OfferRequest, OfferSearchResponse, Order, OrderSearchResponse,
    PriceQuantityEntry, PublishOfferResponse, ShipToLocationAvailability, TokenResponse,
};

const MAX_ERROR_BODY_LEN: usize = 512;

/// Client for the marketplace REST APIs.
///
/// Use [`EbayClient::new`] with the sandbox or production root from
/// configuration, or a mock server URI in tests.
pub struct EbayClient {
    client: Client,
    base_url: Url,
}

impl EbayClient {
    /// Creates a client with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`MarketplaceError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, MarketplaceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("dropship-sync/0.1 (listing-sync)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| MarketplaceError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Exchanges client credentials for an application access token.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::Status`] if the identity service rejects the
    ///   credentials or scopes.
    /// - [`MarketplaceError::Http`] on network failure or timeout.
    /// - [`MarketplaceError::Deserialize`] if the body is not a token response.
    pub async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
        scopes: &[String],
    ) -> Result<TokenResponse, MarketplaceError> {
        let url = self.endpoint(&["identity", "v1", "oauth2", "token"])?;
        let scope = scopes.join(" ");
        let form = [("grant_type", "client_credentials"), ("scope", scope.as_str())];

        let response = self
            .client
            .post(url)
            .basic_auth(client_id, Some(client_secret))
            .form(&form)
            .send()
            .await?;
        let response = Self::check_status(response, "oauth2 token").await?;
        Self::read_json(response, "oauth2 token").await
    }

    /// Creates or replaces the inventory item keyed by `sku`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Status`] on a non-2xx response and
    /// [`MarketplaceError::Http`] on network failure.
    pub async fn upsert_inventory(
        &self,
        token: &str,
        sku: &str,
        item: &InventoryItemRequest,
    ) -> Result<(), MarketplaceError> {
        let url = self.endpoint(&["sell", "inventory", "v1", "inventory_item", sku])?;
        tracing::debug!(sku, "upserting inventory item");

        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_LANGUAGE, "en-US")
            .json(item)
            .send()
            .await?;
        Self::check_status(response, &format!("inventory_item {sku}")).await?;
        Ok(())
    }

    /// Creates an offer and returns its id.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::OfferExists`] on HTTP 409 or error id 25002.
    /// - [`MarketplaceError::MissingField`] if a 2xx response has no `offerId`.
    /// - [`MarketplaceError::Status`] on any other non-2xx response.
    /// - [`MarketplaceError::Http`] on network failure.
    pub async fn create_offer(
        &self,
        token: &str,
        offer: &OfferRequest,
    ) -> Result<String, MarketplaceError> {
        let url = self.endpoint(&["sell", "inventory", "v1", "offer"])?;
        let context = format!("create offer {}", offer.sku);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_LANGUAGE, "en-US")
            .json(offer)
            .send()
            .await?;

        let response = match Self::check_status(response, &context).await {
            Ok(response) => response,
            Err(err) if is_offer_exists(&err) => {
                return Err(MarketplaceError::OfferExists {
                    sku: offer.sku.clone(),
                });
            }
            Err(err) => return Err(err),
        };

        let body: CreateOfferResponse = Self::read_json(response, &context).await?;
        body.offer_id
            .filter(|id| !id.is_empty())
            .ok_or(MarketplaceError::MissingField {
                context,
                field: "offerId",
            })
    }

    /// Looks up the offer id for `sku`, if an offer exists.
    ///
    /// A 404 means the SKU has no offers and maps to `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Status`] on any other non-2xx response,
    /// [`MarketplaceError::Http`] on network failure, and
    /// [`MarketplaceError::Deserialize`] on a malformed body.
    pub async fn find_offer_by_sku(
        &self,
        token: &str,
        sku: &str,
    ) -> Result<Option<String>, MarketplaceError> {
        let mut url = self.endpoint(&["sell", "inventory", "v1", "offer"])?;
        url.query_pairs_mut().append_pair("sku", sku);
        let context = format!("get offers {sku}");

        let response = self.client.get(url).bearer_auth(token).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_status(response, &context).await?;
        let body: OfferSearchResponse = Self::read_json(response, &context).await?;

        Ok(body
            .offers
            .into_iter()
            .filter_map(|offer| offer.offer_id)
            .find(|id| !id.is_empty()))
    }

    /// Replaces an existing offer with `offer`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Status`] on a non-2xx response and
    /// [`MarketplaceError::Http`] on network failure.
    pub async fn update_offer(
        &self,
        token: &str,
        offer_id: &str,
        offer: &OfferRequest,
    ) -> Result<(), MarketplaceError> {
        let url = self.endpoint(&["sell", "inventory", "v1", "offer", offer_id])?;
        tracing::debug!(offer_id, sku = %offer.sku, "updating existing offer");

        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_LANGUAGE, "en-US")
            .json(offer)
            .send()
            .await?;
        Self::check_status(response, &format!("update offer {offer_id}")).await?;
        Ok(())
    }

    /// Publishes an offer and returns the listing id when the marketplace
    /// reports one.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Status`] on a non-2xx response,
    /// [`MarketplaceError::Http`] on network failure, and
    /// [`MarketplaceError::Deserialize`] if a non-empty body is not JSON.
    pub async fn publish_offer(
        &self,
        token: &str,
        offer_id: &str,
    ) -> Result<Option<String>, MarketplaceError> {
        let url = self.endpoint(&["sell", "inventory", "v1", "offer", offer_id, "publish"])?;
        let context = format!("publish offer {offer_id}");

        let response = self.client.post(url).bearer_auth(token).send().await?;
        let response = Self::check_status(response, &context).await?;

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let body: PublishOfferResponse =
            serde_json::from_str(&text).map_err(|e| MarketplaceError::Deserialize {
                context,
                source: e,
            })?;
        Ok(body.listing_id.filter(|id| !id.is_empty()))
    }

    /// Sets the available quantity for `sku` through the bulk price/quantity
    /// endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Status`] on a non-2xx response or when the
    /// per-SKU result reports a failure, and [`MarketplaceError::Http`] on
    /// network failure.
    pub async fn update_quantity(
        &self,
        token: &str,
        sku: &str,
        quantity: u32,
    ) -> Result<(), MarketplaceError> {
        let url = self.endpoint(&["sell", "inventory", "v1", "bulk_update_price_quantity"])?;
        let context = format!("update quantity {sku}");
        let request = BulkPriceQuantityRequest {
            requests: vec![PriceQuantityEntry {
                sku: sku.to_owned(),
                ship_to_location_availability: ShipToLocationAvailability { quantity },
            }],
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response, &context).await?;
        let body: BulkPriceQuantityResponse = Self::read_json(response, &context).await?;

        // The endpoint answers 200 for the batch and reports each SKU separately.
        if let Some(failed) = body
            .responses
            .iter()
            .find(|r| r.status_code.is_some_and(|s| !(200..300).contains(&s)))
        {
            return Err(MarketplaceError::Status {
                status: failed.status_code.unwrap_or_default(),
                context: format!(
                    "update quantity {}",
                    failed.sku.as_deref().unwrap_or(sku)
                ),
                body: summarize_errors(&failed.errors),
            });
        }
        Ok(())
    }

    /// Lists recent orders from the fulfillment API.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Status`] on a non-2xx response,
    /// [`MarketplaceError::Http`] on network failure, and
    /// [`MarketplaceError::Deserialize`] on a malformed body.
    pub async fn list_orders(&self, token: &str, limit: u32) -> Result<Vec<Order>, MarketplaceError> {
        let mut url = self.endpoint(&["sell", "fulfillment", "v1", "order"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let response = Self::check_status(response, "list orders").await?;
        let body: OrderSearchResponse = Self::read_json(response, "list orders").await?;
        Ok(body.orders)
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, MarketplaceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| MarketplaceError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Passes 2xx responses through and turns everything else into
    /// [`MarketplaceError::Status`] carrying a summary of the error body.
    async fn check_status(response: Response, context: &str) -> Result<Response, MarketplaceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let parsed: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let body = if parsed.errors.is_empty() {
            truncate(&text)
        } else {
            summarize_errors(&parsed.errors)
        };

        tracing::debug!(
            status = status.as_u16(),
            context,
            body = %body,
            "marketplace request rejected"
        );
        Err(MarketplaceError::Status {
            status: status.as_u16(),
            context: context.to_owned(),
            body,
        })
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
        context: &str,
    ) -> Result<T, MarketplaceError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| MarketplaceError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

/// 409, or an error body carrying error id 25002.
fn is_offer_exists(err: &MarketplaceError) -> bool {
    match err {
        MarketplaceError::Status { status, body, .. } => {
            *status == StatusCode::CONFLICT.as_u16()
                || body.contains(&format!("[{OFFER_EXISTS_ERROR_ID}]"))
        }
        _ => false,
    }
}

fn summarize_errors(errors: &[crate::types::ApiErrorDetail]) -> String {
    let summary = errors
        .iter()
        .map(|e| {
            let id = e.error_id.map(|id| format!("[{id}] ")).unwrap_or_default();
            format!("{id}{}", e.message.as_deref().unwrap_or("unknown error"))
        })
        .collect::<Vec<_>>()
        .join("; ");
    truncate(&summary)
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_ERROR_BODY_LEN).collect()
}
