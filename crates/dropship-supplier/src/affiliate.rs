//! Affiliate deep links for supplier product pages.

use dropship_core::AppConfig;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;

const ITEM_URL_BASE: &str = "https://www.aliexpress.com/item";
const DEEP_LINK_BASE: &str = "https://s.click.aliexpress.com/deep_link";

#[derive(Debug, Clone, Default)]
pub struct AffiliateSettings {
    pub enabled: bool,
    pub tracking_id: Option<String>,
    pub sub_id: Option<String>,
}

impl AffiliateSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            enabled: config.affiliate_enabled,
            tracking_id: config.affiliate_tracking_id.clone(),
            sub_id: config.affiliate_sub_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffiliateLink {
    pub product_id: String,
    pub link: String,
    pub affiliate: bool,
}

/// Builds the public link for a supplier product.
///
/// With affiliate links disabled this is the plain item page. Otherwise the
/// item page is wrapped in a deep link carrying the tracking and sub ids that
/// are configured.
#[must_use]
pub fn affiliate_link(product_id: &str, settings: &AffiliateSettings) -> AffiliateLink {
    let item_url = format!("{ITEM_URL_BASE}/{product_id}.html");
    if !settings.enabled {
        return AffiliateLink {
            product_id: product_id.to_owned(),
            link: item_url,
            affiliate: false,
        };
    }

    let mut params = vec![("dl", item_url.as_str())];
    if let Some(tracking_id) = settings.tracking_id.as_deref().filter(|s| !s.is_empty()) {
        params.push(("aff_pid", tracking_id));
    }
    if let Some(sub_id) = settings.sub_id.as_deref().filter(|s| !s.is_empty()) {
        params.push(("sub", sub_id));
    }

    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={}", utf8_percent_encode(v, NON_ALPHANUMERIC)))
        .collect::<Vec<_>>()
        .join("&");

    AffiliateLink {
        product_id: product_id.to_owned(),
        link: format!("{DEEP_LINK_BASE}?{query}"),
        affiliate: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_returns_plain_item_url() {
        let link = affiliate_link("123", &AffiliateSettings::default());
        assert_eq!(link.link, "https://www.aliexpress.com/item/123.html");
        assert!(!link.affiliate);
    }

    #[test]
    fn enabled_wraps_item_url_in_deep_link() {
        let settings = AffiliateSettings {
            enabled: true,
            tracking_id: Some("pid42".to_string()),
            sub_id: Some("spring sale".to_string()),
        };
        let link = affiliate_link("123", &settings);
        assert!(link.affiliate);
        assert_eq!(
            link.link,
            "https://s.click.aliexpress.com/deep_link?\
             dl=https%3A%2F%2Fwww%2Ealiexpress%2Ecom%2Fitem%2F123%2Ehtml\
             &aff_pid=pid42&sub=spring%20sale"
        );
    }

    #[test]
    fn empty_ids_are_omitted() {
        let settings = AffiliateSettings {
            enabled: true,
            tracking_id: Some(String::new()),
            sub_id: None,
        };
        let link = affiliate_link("9", &settings);
        assert!(!link.link.contains("aff_pid"));
        assert!(!link.link.contains("sub="));
    }
}
