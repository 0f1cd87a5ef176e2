use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, Result};

pub const DEFAULT_PAYMENT_METHOD: &str = "cash_on_delivery";

/// Known order states. The column itself is plain text so rows written with
/// other values stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Human readable label, e.g. `Shipped`
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(AppError::Validation(format!("Unknown order status: {}", other))),
        }
    }
}

/// Database order model
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub order_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub total_cents: i64,
    pub status: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order. Title and author are captured at purchase time so
/// the line survives deletion of the book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: String,
    pub book_id: Option<i64>,
    pub title: String,
    pub author: String,
    pub quantity: i64,
    pub price_cents: i64,
}

impl OrderItem {
    pub fn line_total_cents(&self) -> i64 {
        self.quantity * self.price_cents
    }
}

/// Order row as shown in the admin order list
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub item_count: i64,
    pub book_titles: Option<String>,
}

/// Order with its lines
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Contact details entered on the checkout form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl CustomerDetails {
    pub fn validate(&self) -> Result<()> {
        if self.customer_name.trim().is_empty() {
            return Err(AppError::Validation("Customer name is required.".into()));
        }
        let email = self.customer_email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation("A valid email address is required.".into()));
        }
        Ok(())
    }

    pub fn payment_method(&self) -> &str {
        self.payment_method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_PAYMENT_METHOD)
    }
}

/// Admin status update request
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!(" pending ".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert!(matches!(
            "lost".parse::<OrderStatus>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_customer_validation() {
        let mut details = CustomerDetails {
            customer_name: "Ada".into(),
            customer_email: "ada@example.com".into(),
            ..Default::default()
        };
        assert!(details.validate().is_ok());
        assert_eq!(details.payment_method(), DEFAULT_PAYMENT_METHOD);

        details.customer_email = "nope".into();
        assert!(matches!(details.validate(), Err(AppError::Validation(_))));
    }
}
