use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Notification categories shown on the admin dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookAdded,
    BookDeleted,
    LowStock,
    NewOrder,
    OrderUpdated,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::BookAdded => "book_added",
            NotificationKind::BookDeleted => "book_deleted",
            NotificationKind::LowStock => "low_stock",
            NotificationKind::NewOrder => "new_order",
            NotificationKind::OrderUpdated => "order_updated",
        }
    }
}

/// Database notification model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A notification that has not been written yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl NewNotification {
    pub fn book_added(title: &str, author: &str) -> Self {
        Self {
            kind: NotificationKind::BookAdded,
            title: "New Book Added".into(),
            message: format!("\"{}\" by {} has been added to the catalog.", title, author),
        }
    }

    pub fn book_deleted(title: &str) -> Self {
        Self {
            kind: NotificationKind::BookDeleted,
            title: "Book Deleted".into(),
            message: format!("\"{}\" has been removed from the catalog.", title),
        }
    }

    pub fn low_stock(title: &str, remaining: i64) -> Self {
        Self {
            kind: NotificationKind::LowStock,
            title: "Low Stock Alert".into(),
            message: format!("\"{}\" is now low on stock ({} remaining).", title, remaining),
        }
    }

    pub fn new_order(order_id: &str, customer: &str, total: &str) -> Self {
        Self {
            kind: NotificationKind::NewOrder,
            title: "New Order Received".into(),
            message: format!("Order {} placed by {} for ${}", order_id, customer, total),
        }
    }

    pub fn order_updated(order_id: &str, status_label: &str) -> Self {
        Self {
            kind: NotificationKind::OrderUpdated,
            title: "Order Status Updated".into(),
            message: format!("Order {} status changed to {}.", order_id, status_label),
        }
    }
}

/// Decide whether moving a book from `previous` to `current` stock crosses
/// its low-stock threshold. Only the downward crossing fires.
pub fn crosses_threshold(previous: i64, current: i64, threshold: i64) -> bool {
    previous > threshold && current <= threshold
}

#[derive(Debug, Deserialize)]
pub struct NotificationListParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}
