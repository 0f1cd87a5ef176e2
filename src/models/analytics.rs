use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{book::Book, notification::Notification, order::OrderSummary};

/// Headline numbers for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct DashboardStats {
    pub total_books: i64,
    pub total_stock: i64,
    pub low_stock_books: i64,
    pub out_of_stock: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub today_orders: i64,
    pub total_revenue_cents: i64,
    pub today_revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TopSeller {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub price_cents: i64,
    pub stock: i64,
    pub total_sold: i64,
    pub total_revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GenreSales {
    pub genre: String,
    pub total_sold: i64,
    pub total_revenue_cents: i64,
    pub book_count: i64,
}

/// Orders and revenue bucketed by month (`2024-05`) or week (`2024-W19`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PeriodSales {
    pub period: String,
    pub order_count: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DailySales {
    pub date: String,
    pub quantity_sold: i64,
    pub revenue_cents: i64,
}

/// One row of the inventory export
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct InventoryRow {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub stock_threshold: i64,
    pub total_sold: i64,
    pub total_revenue_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub top_books: Vec<TopSeller>,
    pub low_stock: Vec<Book>,
    pub recent_orders: Vec<OrderSummary>,
    pub recent_notifications: Vec<Notification>,
    pub unread_notifications: i64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsReport {
    pub stats: DashboardStats,
    pub top_books: Vec<TopSeller>,
    pub genre_sales: Vec<GenreSales>,
    pub monthly: Vec<PeriodSales>,
    pub weekly: Vec<PeriodSales>,
    pub daily: Vec<DailySales>,
}

#[derive(Debug, Serialize)]
pub struct InventoryView {
    pub books: Vec<Book>,
    pub low_stock: Vec<Book>,
    pub out_of_stock: Vec<Book>,
}
