// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Mapping of raw upstream payloads into the canonical schema
//!
//! There is one pure function per (upstream, entity) pair. Raw items are decoded
//! into lenient structs one at a time, so a single malformed item is skipped with a
//! warning instead of discarding the whole page. Every numeric field passes through
//! [`safe_number`].

use api_client::{FetchError, FetchResult};
use market_types::Number;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

pub mod creator;
pub mod product;
pub mod video;

pub use creator::{normalize_open_api_creators, normalize_web_api_creators};
pub use product::{
    GoodsPage, normalize_open_api_products, normalize_web_api_goods, normalize_web_api_products,
};
pub use video::normalize_video_list;

/// Coerce a loosely typed upstream value into a finite number
///
/// Absent values, `null`, `""` and `"-"` yield `default`. Strings lose a trailing
/// `%` and parse as an integer unless they contain a decimal point. Anything that
/// cannot be parsed, or parses to a non-finite float, also yields `default`.
pub fn safe_number(value: Option<&Value>, default: Number) -> Number {
    match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .map(Number::Int)
            .or_else(|| number.as_f64().and_then(Number::finite))
            .unwrap_or(default),
        Some(Value::String(text)) => parse_numeric_text(text).unwrap_or(default),
        _ => default,
    }
}

fn parse_numeric_text(text: &str) -> Option<Number> {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return None;
    }

    let text = text.trim_end_matches('%').trim();
    if text.contains('.') {
        text.parse::<f64>().ok().and_then(Number::finite)
    } else {
        text.parse::<i64>().ok().map(Number::Int)
    }
}

pub(crate) fn safe_i64(value: Option<&Value>) -> i64 {
    safe_number(value, Number::ZERO).as_i64()
}

pub(crate) fn safe_f64(value: Option<&Value>) -> f64 {
    safe_number(value, Number::ZERO).as_f64()
}

/// Render a string, number or boolean as text; anything else becomes empty
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

/// Deserialize a field that upstream sends as either a string or a number
pub(crate) fn loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(value_text).unwrap_or_default())
}

/// Top-level category name from any observed shape
///
/// Accepted: `{l1: {name}}`, `{l1_name}`, `{name}`, a plain string, or a list whose
/// first element is any of those.
pub(crate) fn category_name(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(name)) => name.clone(),
        Some(Value::Object(category)) => {
            if let Some(name) = category
                .get("l1")
                .and_then(Value::as_object)
                .and_then(|l1| l1.get("name"))
            {
                return value_text(name);
            }
            category
                .get("l1_name")
                .or_else(|| category.get("name"))
                .map(value_text)
                .unwrap_or_default()
        }
        Some(Value::Array(items)) => category_name(items.first()),
        _ => String::new(),
    }
}

/// Category names from a list of names or of `{name}` objects
pub(crate) fn category_names(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| match item {
            Value::Object(category) => category.get("name").map(value_text).unwrap_or_default(),
            other => value_text(other),
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// Reported total, accepting a number, a numeric string or `{total: n}`
pub(crate) fn total_count(value: Option<&Value>) -> u64 {
    let value = match value {
        Some(Value::Object(total)) => total.get("total"),
        other => other,
    };
    u64::try_from(safe_number(value, Number::ZERO).as_i64()).unwrap_or(0)
}

/// Decode the item list under `field`, skipping items that fail to decode
///
/// A missing or non-array list is a malformed response.
pub(crate) fn decode_items<T>(data: &Value, field: &str, source: &str) -> FetchResult<Vec<T>>
where
    T: DeserializeOwned,
{
    Ok(decode_indexed_items(data, field, source)?
        .into_iter()
        .map(|(_, item)| item)
        .collect())
}

/// Like [`decode_items`], keeping each item's position in the raw list
pub(crate) fn decode_indexed_items<T>(
    data: &Value,
    field: &str,
    source: &str,
) -> FetchResult<Vec<(usize, T)>>
where
    T: DeserializeOwned,
{
    let items = data
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::malformed(format!("{source} response has no '{field}' list")))?;

    Ok(items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(decoded) => Some((index, decoded)),
            Err(e) => {
                warn!(source, index, error = %e, "skipping undecodable item");
                None
            }
        })
        .collect())
}
