//! Lenient coercion of supplier scalar fields.
//!
//! Supplier numerics are untrusted: anything that is missing, malformed, or
//! negative becomes zero instead of failing the import. Text and list fields
//! of an unexpected JSON type are treated as absent.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

/// Parses a price from a JSON string or number. Returns zero for anything
/// else, and clamps negative values to zero.
#[must_use]
pub fn parse_price(value: Option<&Value>) -> Decimal {
    let parsed = value.and_then(decimal_from_value).unwrap_or(Decimal::ZERO);
    parsed.max(Decimal::ZERO)
}

/// Parses a stock count from a JSON string or number.
///
/// Fractional input is truncated; negative or unparseable input yields zero;
/// values beyond `u32::MAX` saturate.
#[must_use]
pub fn parse_quantity(value: Option<&Value>) -> u32 {
    let Some(parsed) = value.and_then(decimal_from_value) else {
        return 0;
    };
    if parsed.is_sign_negative() {
        return 0;
    }
    parsed.trunc().to_u32().unwrap_or(u32::MAX)
}

/// Reads a text field. Numbers and booleans are rendered; objects, arrays
/// and `null` count as absent.
#[must_use]
pub fn text_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Variant entries when the field is an array, otherwise none.
#[must_use]
pub fn variant_list(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Flattens item specifics to `name -> text`.
///
/// Accepts an object of `name: value`, or an array of
/// `{"attr_name": .., "attr_value": ..}` pairs. Anything else yields no specs.
#[must_use]
pub fn spec_map(value: Option<&Value>) -> BTreeMap<String, String> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, value)| (name.clone(), spec_value_to_string(value)))
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let name = text_value(item.get("attr_name"))?;
                let value = item.get("attr_value").map(spec_value_to_string)?;
                Some((name, value))
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Splits a `;`-delimited URL list, trimming whitespace and dropping empty
/// segments.
#[must_use]
pub fn split_image_urls(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(';')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

/// Renders a supplier id that may arrive as a string or a number.
#[must_use]
pub fn id_to_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Renders an item-specific value as plain text. Strings are taken as-is,
/// other JSON values are serialized.
#[must_use]
pub fn spec_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64_retain)),
        _ => None,
    }
}
