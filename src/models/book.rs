use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    error::{AppError, Result},
    models::money::parse_price,
};

pub const DEFAULT_STOCK_THRESHOLD: i64 = 5;

/// Database book model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub genre: Option<String>,
    pub image_filename: Option<String>,
    pub stock_threshold: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated book fields, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub genre: Option<String>,
    pub stock_threshold: i64,
}

/// Raw book form as submitted by the admin panel.
///
/// Numeric fields stay textual until [`BookForm::validate`] so that bad input
/// is reported per field instead of failing deserialization as a whole.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: String,
    pub stock: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub stock_threshold: Option<String>,
}

impl BookForm {
    pub fn validate(&self) -> Result<BookInput> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title is required.".into()));
        }
        let author = self.author.trim();
        if author.is_empty() {
            return Err(AppError::Validation("Author is required.".into()));
        }

        let price_cents = parse_price(&self.price)?;
        let stock = parse_count(&self.stock, "Stock")?;
        let stock_threshold = match self.stock_threshold.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_STOCK_THRESHOLD,
            Some(raw) => parse_count(raw, "Stock threshold")?,
        };

        Ok(BookInput {
            title: title.to_string(),
            author: author.to_string(),
            description: non_empty(self.description.as_deref()),
            price_cents,
            stock,
            genre: non_empty(self.genre.as_deref()),
            stock_threshold,
        })
    }
}

fn parse_count(raw: &str, field: &str) -> Result<i64> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("{} must be a valid integer.", field)))?;
    if value < 0 {
        return Err(AppError::Validation(format!(
            "{} must be a non-negative integer.",
            field
        )));
    }
    Ok(value)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Sort orders offered by the storefront search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookSort {
    #[default]
    Title,
    PriceLow,
    PriceHigh,
    Newest,
    Author,
}

impl BookSort {
    pub fn order_by(self) -> &'static str {
        match self {
            BookSort::Title => " ORDER BY title",
            BookSort::PriceLow => " ORDER BY price_cents ASC",
            BookSort::PriceHigh => " ORDER BY price_cents DESC",
            BookSort::Newest => " ORDER BY created_at DESC, id DESC",
            BookSort::Author => " ORDER BY author",
        }
    }
}

/// Search parameters as received in the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookSearchParams {
    pub q: Option<String>,
    pub genre: Option<String>,
    pub author: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    #[serde(default)]
    pub sort: BookSort,
}

/// Parsed search filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    pub text: Option<String>,
    pub genre: Option<String>,
    pub author: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub sort: BookSort,
}

impl TryFrom<BookSearchParams> for BookFilter {
    type Error = AppError;

    fn try_from(params: BookSearchParams) -> Result<Self> {
        let price = |raw: Option<String>| -> Result<Option<i64>> {
            match non_empty(raw.as_deref()) {
                Some(value) => parse_price(&value).map(Some),
                None => Ok(None),
            }
        };

        Ok(Self {
            text: non_empty(params.q.as_deref()),
            genre: non_empty(params.genre.as_deref()),
            author: non_empty(params.author.as_deref()),
            min_price_cents: price(params.min_price)?,
            max_price_cents: price(params.max_price)?,
            sort: params.sort,
        })
    }
}

/// Which catalog view a listing is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only books that can currently be bought
    Storefront,
    /// Every book, regardless of stock
    Admin,
}

/// Storefront filter options
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub genres: Vec<String>,
    pub authors: Vec<String>,
}

/// Storefront book detail
#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    pub book: Book,
    pub related: Vec<Book>,
}
