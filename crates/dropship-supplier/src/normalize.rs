//! Normalization from raw supplier responses to [`dropship_core::CanonicalProduct`].
//!
//! This is the only place that looks inside supplier JSON. Structural
//! problems (missing path, empty product list) are errors; scalar problems
//! (bad price, bad stock) are coerced to zero by [`crate::parse`].

use dropship_core::CanonicalProduct;
use serde::Deserialize;

use crate::error::SupplierError;
use crate::parse::{
    id_to_string, parse_price, parse_quantity, spec_map, split_image_urls, text_value,
    variant_list,
};
use crate::types::{ProductDetailEnvelope, RawSupplierProduct, SupplierProductEntry};

/// Normalizes the first product of a raw supplier response.
///
/// # Errors
///
/// Returns [`SupplierError::Normalization`] if the body is not a
/// product-detail envelope, if any level of the path to the product list is
/// missing, or if the list is empty.
pub fn normalize_product(raw: &RawSupplierProduct) -> Result<CanonicalProduct, SupplierError> {
    let fail = |reason: String| SupplierError::Normalization {
        product_id: raw.requested_id.clone(),
        reason,
    };

    let envelope = ProductDetailEnvelope::deserialize(&raw.body)
        .map_err(|e| fail(format!("unexpected response shape: {e}")))?;

    let resp_result = envelope
        .response
        .and_then(|r| r.resp_result)
        .ok_or_else(|| fail("missing product detail response".into()))?;

    let result = match resp_result.result {
        Some(result) => result,
        None => {
            let detail = text_value(resp_result.resp_msg.as_ref())
                .map(|msg| format!(" ({msg})"))
                .unwrap_or_default();
            return Err(fail(format!("response has no result{detail}")));
        }
    };

    let first = result
        .products
        .ok_or_else(|| fail("response has no product list".into()))?
        .into_iter()
        .next()
        .ok_or_else(|| fail("product list is empty".into()))?;

    let entry = SupplierProductEntry::deserialize(&first)
        .map_err(|e| fail(format!("first product is not an object: {e}")))?;

    Ok(to_canonical(&entry, &raw.requested_id))
}

fn to_canonical(entry: &SupplierProductEntry, requested_id: &str) -> CanonicalProduct {
    let id = id_to_string(entry.product_id.as_ref()).unwrap_or_else(|| requested_id.to_owned());
    let image_urls = text_value(entry.image_urls.as_ref());

    CanonicalProduct {
        id,
        title: text_value(entry.subject.as_ref()).unwrap_or_default(),
        description: text_value(entry.description.as_ref()).filter(|d| !d.trim().is_empty()),
        price: parse_price(entry.target_sale_price.as_ref()),
        quantity: parse_quantity(entry.total_available_stock.as_ref()),
        images: split_image_urls(image_urls.as_deref()),
        variants: variant_list(entry.sku_infos.as_ref()),
        category: text_value(entry.first_level_category_name.as_ref()).filter(|c| !c.is_empty()),
        specs: spec_map(entry.specs_module.as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::{json, Value};

    use super::*;

    fn envelope_with(products: Value) -> RawSupplierProduct {
        RawSupplierProduct {
            requested_id: "123456".to_string(),
            body: json!({
                "aliexpress_affiliate_productdetail_get_response": {
                    "resp_result": {
                        "resp_code": 200,
                        "result": { "products": products }
                    }
                }
            }),
        }
    }

    fn sample_entry() -> Value {
        json!({
            "product_id": "123456",
            "subject": "Sim Product 123456",
            "description": "Sample description",
            "target_sale_price": "9.99",
            "total_avaliable_stock": "50",
            "image_urls": "https://img.test/600.jpg;https://img.test/601.jpg",
            "first_level_category_name": "Phones & Telecommunications",
            "brand_name": "Demo",
            "sku_infos": [{"sku_id": "1", "color": "Black"}],
            "specs_module": {"Weight": "200g"}
        })
    }

    #[test]
    fn normalizes_full_entry() {
        let product = normalize_product(&envelope_with(json!([sample_entry()]))).unwrap();
        assert_eq!(product.id, "123456");
        assert_eq!(product.title, "Sim Product 123456");
        assert_eq!(product.description.as_deref(), Some("Sample description"));
        assert_eq!(product.price, Decimal::new(999, 2));
        assert_eq!(product.quantity, 50);
        assert_eq!(product.images.len(), 2);
        assert_eq!(product.variants.len(), 1);
        assert_eq!(
            product.category.as_deref(),
            Some("Phones & Telecommunications")
        );
        assert_eq!(product.specs.get("Weight").map(String::as_str), Some("200g"));
    }

    #[test]
    fn only_first_product_is_used() {
        let mut second = sample_entry();
        second["product_id"] = json!("999");
        let product =
            normalize_product(&envelope_with(json!([sample_entry(), second]))).unwrap();
        assert_eq!(product.id, "123456");
    }

    #[test]
    fn missing_product_list_is_an_error() {
        let raw = RawSupplierProduct {
            requested_id: "123456".to_string(),
            body: json!({
                "aliexpress_affiliate_productdetail_get_response": {
                    "resp_result": { "result": {} }
                }
            }),
        };
        let err = normalize_product(&raw).unwrap_err();
        assert!(
            matches!(err, SupplierError::Normalization { ref product_id, .. } if product_id == "123456"),
            "expected Normalization, got: {err:?}"
        );
    }

    #[test]
    fn empty_product_list_is_an_error() {
        let err = normalize_product(&envelope_with(json!([]))).unwrap_err();
        assert!(matches!(err, SupplierError::Normalization { ref reason, .. } if reason.contains("empty")));
    }

    #[test]
    fn missing_envelope_is_an_error() {
        let raw = RawSupplierProduct {
            requested_id: "1".to_string(),
            body: json!({"error_response": {"code": 15}}),
        };
        assert!(matches!(
            normalize_product(&raw),
            Err(SupplierError::Normalization { .. })
        ));
    }

    #[test]
    fn non_object_body_is_an_error() {
        let raw = RawSupplierProduct {
            requested_id: "1".to_string(),
            body: json!("gateway timeout"),
        };
        assert!(matches!(
            normalize_product(&raw),
            Err(SupplierError::Normalization { .. })
        ));
    }

    #[test]
    fn result_missing_reports_supplier_message() {
        let raw = RawSupplierProduct {
            requested_id: "1".to_string(),
            body: json!({
                "aliexpress_affiliate_productdetail_get_response": {
                    "resp_result": { "resp_code": 405, "resp_msg": "product not found" }
                }
            }),
        };
        let err = normalize_product(&raw).unwrap_err();
        assert!(err.to_string().contains("product not found"));
    }

    #[test]
    fn non_numeric_price_becomes_zero() {
        let mut entry = sample_entry();
        entry["target_sale_price"] = json!("N/A");
        let product = normalize_product(&envelope_with(json!([entry]))).unwrap();
        assert_eq!(product.price, Decimal::ZERO);
    }

    #[test]
    fn missing_numeric_fields_become_zero() {
        let product = normalize_product(&envelope_with(json!([{"product_id": "7"}]))).unwrap();
        assert_eq!(product.price, Decimal::ZERO);
        assert_eq!(product.quantity, 0);
        assert!(product.images.is_empty());
        assert!(product.variants.is_empty());
        assert!(product.specs.is_empty());
        assert_eq!(product.title, "");
    }

    #[test]
    fn missing_product_id_falls_back_to_requested_id() {
        let mut entry = sample_entry();
        entry.as_object_mut().unwrap().remove("product_id");
        let product = normalize_product(&envelope_with(json!([entry]))).unwrap();
        assert_eq!(product.id, "123456");
    }

    #[test]
    fn numeric_product_id_is_stringified() {
        let mut entry = sample_entry();
        entry["product_id"] = json!(1_005_001_234_u64);
        let product = normalize_product(&envelope_with(json!([entry]))).unwrap();
        assert_eq!(product.id, "1005001234");
    }

    #[test]
    fn null_variants_become_empty() {
        let mut entry = sample_entry();
        entry["sku_infos"] = Value::Null;
        let product = normalize_product(&envelope_with(json!([entry]))).unwrap();
        assert!(product.variants.is_empty());
        assert_eq!(product.title, "Sim Product 123456");
    }

    #[test]
    fn mistyped_fields_are_coerced_not_rejected() {
        let mut entry = sample_entry();
        entry["subject"] = json!(12345);
        entry["specs_module"] = json!(["Weight", "200g"]);
        entry["image_urls"] = json!({"main": "https://img.test/1.jpg"});
        entry["first_level_category_name"] = Value::Null;
        let product = normalize_product(&envelope_with(json!([entry]))).unwrap();
        assert_eq!(product.title, "12345");
        assert!(product.specs.is_empty());
        assert!(product.images.is_empty());
        assert!(product.category.is_none());
        assert_eq!(product.quantity, 50);
    }

    #[test]
    fn malformed_second_entry_is_ignored() {
        let product =
            normalize_product(&envelope_with(json!([sample_entry(), "garbage"]))).unwrap();
        assert_eq!(product.id, "123456");
    }

    #[test]
    fn non_object_first_entry_is_an_error() {
        let err = normalize_product(&envelope_with(json!(["garbage"]))).unwrap_err();
        assert!(matches!(err, SupplierError::Normalization { .. }));
    }

    #[test]
    fn blank_description_is_treated_as_absent() {
        let mut entry = sample_entry();
        entry["description"] = json!("   ");
        let product = normalize_product(&envelope_with(json!([entry]))).unwrap();
        assert!(product.description.is_none());
    }
}
