use regex::Regex;
use serde_json::Value;

use crate::models::{
    BookRecord, RawItem, DEFAULT_AUTHORS, DEFAULT_CATEGORIES, DEFAULT_COUNTRY,
    DEFAULT_DESCRIPTION, DEFAULT_LANGUAGE, DEFAULT_PUBLISHER, DEFAULT_SALEABILITY, DEFAULT_TITLE,
    UNKNOWN_YEAR,
};

const MAX_RATING: f64 = 5.0;

/// Map raw search results onto flat records. Never fails: every item yields
/// exactly one record, with defaults filling whatever the provider left out.
pub fn transform(items: &[RawItem]) -> Vec<BookRecord> {
    items.iter().map(transform_item).collect()
}

pub fn transform_item(item: &RawItem) -> BookRecord {
    let info = item.get("volumeInfo").unwrap_or(&Value::Null);
    let sale = item.get("saleInfo").unwrap_or(&Value::Null);
    let list_price = sale.get("listPrice").unwrap_or(&Value::Null);
    let retail_price = sale.get("retailPrice").unwrap_or(&Value::Null);

    BookRecord {
        book_id: string_field(item, "id"),
        title: string_or(info, "title", DEFAULT_TITLE),
        subtitle: string_or(info, "subtitle", DEFAULT_TITLE),
        authors: joined_or(info, "authors", DEFAULT_AUTHORS),
        description: string_or(info, "description", DEFAULT_DESCRIPTION),
        categories: joined_or(info, "categories", DEFAULT_CATEGORIES),
        page_count: count_field(info, "pageCount"),
        language: string_or(info, "language", DEFAULT_LANGUAGE),
        image_link: info
            .get("imageLinks")
            .and_then(|links| string_field(links, "thumbnail"))
            .unwrap_or_default(),
        average_rating: number_field(info, "averageRating")
            .map(|value| value.clamp(0.0, MAX_RATING))
            .unwrap_or(0.0),
        ratings_count: count_field(info, "ratingsCount"),
        publisher: string_or(info, "publisher", DEFAULT_PUBLISHER),
        published_year: info
            .get("publishedDate")
            .and_then(|value| value.as_str())
            .map(published_year)
            .unwrap_or_else(|| UNKNOWN_YEAR.to_string()),
        is_ebook: sale.get("isEbook").map(is_truthy).unwrap_or(false) as i64,
        saleability: string_or(sale, "saleability", DEFAULT_SALEABILITY),
        amount_list_price: price_field(list_price),
        currency_code_list_price: string_or(list_price, "currencyCode", ""),
        amount_retail_price: price_field(retail_price),
        currency_code_retail_price: string_or(retail_price, "currencyCode", ""),
        buy_link: string_or(sale, "buyLink", ""),
        country: string_or(sale, "country", DEFAULT_COUNTRY),
    }
}

/// Leading four characters of a date string when they are all digits,
/// "Unknown" otherwise.
pub fn published_year(date: &str) -> String {
    extract_leading_year(date).unwrap_or_else(|| UNKNOWN_YEAR.to_string())
}

fn extract_leading_year(text: &str) -> Option<String> {
    let regex = Regex::new(r"^([0-9]{4})").ok()?;
    let captures = regex.captures(text)?;
    Some(captures.get(1)?.as_str().to_string())
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|entry| entry.as_str())
        .map(|entry| entry.to_string())
}

fn string_or(value: &Value, key: &str, default: &str) -> String {
    string_field(value, key).unwrap_or_else(|| default.to_string())
}

// Empty lists fall back before joining, so the default text is stored
// rather than an empty string.
fn joined_or(value: &Value, key: &str, default: &str) -> String {
    let joined = value
        .get(key)
        .and_then(|entry| entry.as_array())
        .map(|values| {
            values
                .iter()
                .filter_map(|entry| entry.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();
    if joined.is_empty() {
        default.to_string()
    } else {
        joined
    }
}

fn number_field(value: &Value, key: &str) -> Option<f64> {
    let number = match value.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn count_field(value: &Value, key: &str) -> i64 {
    number_field(value, key)
        .map(|number| number.max(0.0).trunc() as i64)
        .unwrap_or(0)
}

fn price_field(price: &Value) -> f64 {
    number_field(price, "amount")
        .map(|amount| amount.max(0.0))
        .unwrap_or(0.0)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(text) => !text.is_empty(),
        Value::Array(values) => !values.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
