use serde::{Deserialize, Serialize};

/// An unprocessed search result as returned by the books API.
pub type RawItem = serde_json::Value;

pub const DEFAULT_TITLE: &str = "N/A";
pub const DEFAULT_AUTHORS: &str = "Unknown Author";
pub const DEFAULT_DESCRIPTION: &str = "No description available.";
pub const DEFAULT_CATEGORIES: &str = "N/A";
pub const DEFAULT_LANGUAGE: &str = "Unknown";
pub const DEFAULT_PUBLISHER: &str = "Unknown Publisher";
pub const UNKNOWN_YEAR: &str = "Unknown";
pub const DEFAULT_SALEABILITY: &str = "Not for Sale";
pub const DEFAULT_COUNTRY: &str = "N/A";

/// Flat, fully defaulted row of the `books` table.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BookRecord {
    pub book_id: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub authors: String, // comma-joined
    pub description: String,
    pub categories: String, // comma-joined
    pub page_count: i64,
    pub language: String,
    pub image_link: String,
    pub average_rating: f64,
    pub ratings_count: i64,
    pub publisher: String,
    pub published_year: String, // 4 digits or "Unknown"
    pub is_ebook: i64,          // 0 or 1
    pub saleability: String,
    pub amount_list_price: f64,
    pub currency_code_list_price: String,
    pub amount_retail_price: f64,
    pub currency_code_retail_price: String,
    pub buy_link: String,
    pub country: String,
}

impl Default for BookRecord {
    fn default() -> Self {
        Self {
            book_id: None,
            title: DEFAULT_TITLE.to_string(),
            subtitle: DEFAULT_TITLE.to_string(),
            authors: DEFAULT_AUTHORS.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            categories: DEFAULT_CATEGORIES.to_string(),
            page_count: 0,
            language: DEFAULT_LANGUAGE.to_string(),
            image_link: String::new(),
            average_rating: 0.0,
            ratings_count: 0,
            publisher: DEFAULT_PUBLISHER.to_string(),
            published_year: UNKNOWN_YEAR.to_string(),
            is_ebook: 0,
            saleability: DEFAULT_SALEABILITY.to_string(),
            amount_list_price: 0.0,
            currency_code_list_price: String::new(),
            amount_retail_price: 0.0,
            currency_code_retail_price: String::new(),
            buy_link: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}
