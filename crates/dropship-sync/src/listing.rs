//! Pricing and listing construction.
//!
//! Everything here is pure: identical inputs always give an identical
//! payload. The publisher relies on that to make retries of a whole pipeline
//! run converge on the same SKU-keyed marketplace entities.

use std::collections::BTreeMap;

use dropship_core::{AppConfig, CanonicalProduct, ListingPayload};
use dropship_marketplace::{
    Amount, Availability, InventoryItemRequest, InventoryProduct, OfferRequest, PricingSummary,
    ShipToLocationAvailability,
};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::SyncError;

/// Marketplace title limit, in characters.
pub const TITLE_MAX_LEN: usize = 80;
/// Largest quantity ever offered, whatever the supplier stock.
pub const QUANTITY_CAP: u32 = 999;

const OFFER_FORMAT: &str = "FIXED_PRICE";
const ITEM_CONDITION: &str = "NEW";

/// Supplier first-level categories with a known marketplace category id.
const CATEGORY_ALIASES: &[(&str, &str)] = &[
    ("Phones & Telecommunications", "15032"),
    ("Computer & Office", "58058"),
    ("Consumer Electronics", "293"),
    ("Women's Clothing", "11450"),
    ("Home & Garden", "11700"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingConfig {
    pub sku_prefix: String,
    pub marketplace_id: String,
    pub currency: String,
}

impl ListingConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            sku_prefix: config.sku_prefix.clone(),
            marketplace_id: config.marketplace_id.clone(),
            currency: config.currency.clone(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            sku_prefix: "ALI".to_string(),
            marketplace_id: "EBAY_AU".to_string(),
            currency: "USD".to_string(),
        }
    }
}

/// Rejects negative markups.
///
/// # Errors
///
/// Returns [`SyncError::InvalidMarkup`] when `markup_percent < 0`.
pub fn validate_markup(markup_percent: Decimal) -> Result<Decimal, SyncError> {
    if markup_percent < Decimal::ZERO {
        return Err(SyncError::InvalidMarkup(markup_percent));
    }
    Ok(markup_percent)
}

#[must_use]
pub fn sku_for(prefix: &str, product_id: &str) -> String {
    format!("{prefix}-{product_id}")
}

/// `price × (1 + markup/100)`, rounded half away from zero to cents.
///
/// Returns `None` when the result does not fit in a [`Decimal`].
#[must_use]
pub fn sell_price(price: Decimal, markup_percent: Decimal) -> Option<Decimal> {
    let factor = markup_percent
        .checked_div(Decimal::ONE_HUNDRED)
        .and_then(|fraction| fraction.checked_add(Decimal::ONE))?;
    let price = price.checked_mul(factor)?;
    Some(price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

#[must_use]
pub fn category_id_for(category: &str) -> Option<&'static str> {
    CATEGORY_ALIASES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(category.trim()))
        .map(|(_, id)| *id)
}

fn truncate_title(title: &str) -> String {
    title.chars().take(TITLE_MAX_LEN).collect()
}

/// Derives the marketplace listing for `product`.
///
/// Callers validate `markup_percent` first; see [`validate_markup`].
///
/// # Errors
///
/// Returns [`SyncError::Pricing`] when the sell price overflows.
pub fn build_listing(
    product: &CanonicalProduct,
    markup_percent: Decimal,
    config: &ListingConfig,
) -> Result<ListingPayload, SyncError> {
    let sell_price =
        sell_price(product.price, markup_percent).ok_or_else(|| SyncError::Pricing {
            product_id: product.id.clone(),
            price: product.price,
            markup_percent,
        })?;

    let aspects: BTreeMap<String, Vec<String>> = product
        .specs
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(name, value)| (name.clone(), vec![value.clone()]))
        .collect();

    Ok(ListingPayload {
        sku: sku_for(&config.sku_prefix, &product.id),
        display_title: truncate_title(&product.title),
        sell_price,
        available_quantity: product.quantity.min(QUANTITY_CAP),
        marketplace_id: config.marketplace_id.clone(),
        currency: config.currency.clone(),
        description: product.description.clone(),
        image_urls: product.images.clone(),
        aspects,
        category_id: product
            .category
            .as_deref()
            .and_then(category_id_for)
            .map(str::to_owned),
    })
}

#[must_use]
pub fn inventory_item(listing: &ListingPayload) -> InventoryItemRequest {
    InventoryItemRequest {
        availability: Availability {
            ship_to_location_availability: ShipToLocationAvailability {
                quantity: listing.available_quantity,
            },
        },
        condition: ITEM_CONDITION.to_string(),
        product: InventoryProduct {
            title: listing.display_title.clone(),
            description: listing.description.clone(),
            image_urls: listing.image_urls.clone(),
            aspects: listing.aspects.clone(),
        },
    }
}

#[must_use]
pub fn offer_request(listing: &ListingPayload) -> OfferRequest {
    OfferRequest {
        sku: listing.sku.clone(),
        marketplace_id: listing.marketplace_id.clone(),
        format: OFFER_FORMAT.to_string(),
        available_quantity: listing.available_quantity,
        pricing_summary: PricingSummary {
            price: Amount {
                value: format!("{:.2}", listing.sell_price),
                currency: listing.currency.clone(),
            },
        },
        category_id: listing.category_id.clone(),
        listing_description: listing.description.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: Decimal, quantity: u32) -> CanonicalProduct {
        CanonicalProduct {
            id: "123456".to_string(),
            title: "Sim Product 123456".to_string(),
            description: Some("Sample description".to_string()),
            price,
            quantity,
            images: vec!["https://img.test/1.jpg".to_string()],
            variants: vec![],
            category: Some("Consumer Electronics".to_string()),
            specs: BTreeMap::from([("Color".to_string(), "Black".to_string())]),
        }
    }

    #[test]
    fn thirty_percent_markup_on_9_99_is_12_99() {
        let listing = build_listing(
            &product(Decimal::new(999, 2), 50),
            Decimal::from(30),
            &ListingConfig::default(),
        )
        .unwrap();
        assert_eq!(listing.sell_price, Decimal::new(1299, 2));
        assert_eq!(listing.sku, "ALI-123456");
        assert_eq!(listing.available_quantity, 50);
    }

    #[test]
    fn midpoint_rounds_away_from_zero() {
        // 1.25 × 1.1 = 1.375
        assert_eq!(
            sell_price(Decimal::new(125, 2), Decimal::from(10)).unwrap(),
            Decimal::new(138, 2)
        );
    }

    #[test]
    fn zero_markup_keeps_price() {
        assert_eq!(
            sell_price(Decimal::new(999, 2), Decimal::ZERO).unwrap(),
            Decimal::new(999, 2)
        );
    }

    #[test]
    fn fractional_markup_is_supported() {
        // 10.00 × 1.125 = 11.25
        assert_eq!(
            sell_price(Decimal::new(1000, 2), Decimal::new(125, 1)).unwrap(),
            Decimal::new(1125, 2)
        );
    }

    #[test]
    fn overflowing_price_is_none() {
        assert_eq!(sell_price(Decimal::MAX, Decimal::from(30)), None);
        assert_eq!(sell_price(Decimal::from(1000), Decimal::MAX), None);
        assert_eq!(sell_price(Decimal::MAX, Decimal::ZERO), Some(Decimal::MAX));
    }

    #[test]
    fn overflowing_price_is_a_pricing_error() {
        let err = build_listing(
            &product(Decimal::MAX, 1),
            Decimal::from(30),
            &ListingConfig::default(),
        )
        .unwrap_err();
        assert!(
            matches!(err, SyncError::Pricing { ref product_id, .. } if product_id == "123456"),
            "expected Pricing, got: {err:?}"
        );
    }

    #[test]
    fn quantity_is_capped() {
        let config = ListingConfig::default();
        let capped = build_listing(&product(Decimal::ONE, 5000), Decimal::ZERO, &config).unwrap();
        assert_eq!(capped.available_quantity, 999);
        let exact = build_listing(&product(Decimal::ONE, 999), Decimal::ZERO, &config).unwrap();
        assert_eq!(exact.available_quantity, 999);
        let empty = build_listing(&product(Decimal::ONE, 0), Decimal::ZERO, &config).unwrap();
        assert_eq!(empty.available_quantity, 0);
    }

    #[test]
    fn title_is_cut_at_80_characters() {
        let mut p = product(Decimal::ONE, 1);
        p.title = "é".repeat(100);
        let listing = build_listing(&p, Decimal::ZERO, &ListingConfig::default()).unwrap();
        assert_eq!(listing.display_title.chars().count(), TITLE_MAX_LEN);
    }

    #[test]
    fn short_title_is_unchanged() {
        let listing = build_listing(
            &product(Decimal::ONE, 1),
            Decimal::ZERO,
            &ListingConfig::default(),
        )
        .unwrap();
        assert_eq!(listing.display_title, "Sim Product 123456");
    }

    #[test]
    fn sku_is_deterministic_and_uses_prefix() {
        assert_eq!(sku_for("ALI", "42"), sku_for("ALI", "42"));
        assert_eq!(sku_for("DS", "42"), "DS-42");
    }

    #[test]
    fn same_inputs_give_same_listing() {
        let p = product(Decimal::new(999, 2), 50);
        let config = ListingConfig::default();
        assert_eq!(
            build_listing(&p, Decimal::from(30), &config).unwrap(),
            build_listing(&p, Decimal::from(30), &config).unwrap()
        );
    }

    #[test]
    fn known_category_maps_to_id() {
        assert_eq!(category_id_for("Consumer Electronics"), Some("293"));
        assert_eq!(category_id_for("home & garden"), Some("11700"));
        assert_eq!(category_id_for("Garden Gnomes"), None);
    }

    #[test]
    fn specs_become_single_value_aspects() {
        let listing = build_listing(
            &product(Decimal::ONE, 1),
            Decimal::ZERO,
            &ListingConfig::default(),
        )
        .unwrap();
        assert_eq!(
            listing.aspects.get("Color"),
            Some(&vec!["Black".to_string()])
        );
    }

    #[test]
    fn negative_markup_is_rejected() {
        assert!(matches!(
            validate_markup(Decimal::new(-1, 0)),
            Err(SyncError::InvalidMarkup(_))
        ));
        assert!(validate_markup(Decimal::ZERO).is_ok());
    }

    #[test]
    fn offer_price_has_two_decimals() {
        let mut listing = build_listing(
            &product(Decimal::from(10), 1),
            Decimal::from(30),
            &ListingConfig::default(),
        )
        .unwrap();
        assert_eq!(offer_request(&listing).pricing_summary.price.value, "13.00");
        listing.sell_price = Decimal::new(1299, 2);
        let offer = offer_request(&listing);
        assert_eq!(offer.pricing_summary.price.value, "12.99");
        assert_eq!(offer.format, "FIXED_PRICE");
        assert_eq!(offer.category_id.as_deref(), Some("293"));
    }

    #[test]
    fn inventory_item_carries_listing_fields() {
        let listing = build_listing(
            &product(Decimal::ONE, 50),
            Decimal::ZERO,
            &ListingConfig::default(),
        )
        .unwrap();
        let item = inventory_item(&listing);
        assert_eq!(item.availability.ship_to_location_availability.quantity, 50);
        assert_eq!(item.product.title, "Sim Product 123456");
        assert_eq!(item.condition, "NEW");
    }
}
