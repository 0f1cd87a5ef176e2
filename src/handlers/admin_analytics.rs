use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    db::notification_store::DEFAULT_RECENT_LIMIT,
    error::Result,
    models::analytics::{AnalyticsReport, Dashboard},
    state::AppState,
};

const DASHBOARD_TOP_BOOKS: i64 = 5;
const DASHBOARD_RECENT_ORDERS: i64 = 10;
const REPORT_TOP_BOOKS: i64 = 10;
const MONTHS: i64 = 12;
const WEEKS: i64 = 12;
const DAYS: i64 = 30;

pub async fn dashboard(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let dashboard = Dashboard {
        stats: state.analytics.dashboard_stats().await?,
        top_books: state.analytics.top_selling_books(DASHBOARD_TOP_BOOKS).await?,
        low_stock: state.analytics.low_stock_alerts().await?,
        recent_orders: state.orders.list(Some(DASHBOARD_RECENT_ORDERS)).await?,
        recent_notifications: state.notifier.store().recent(DEFAULT_RECENT_LIMIT).await?,
        unread_notifications: state.notifier.store().unread_count().await?,
    };

    Ok((StatusCode::OK, Json(dashboard)))
}

pub async fn analytics(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let report = AnalyticsReport {
        stats: state.analytics.dashboard_stats().await?,
        top_books: state.analytics.top_selling_books(REPORT_TOP_BOOKS).await?,
        genre_sales: state.analytics.sales_by_genre().await?,
        monthly: state.analytics.monthly_sales(MONTHS).await?,
        weekly: state.analytics.weekly_sales(WEEKS).await?,
        daily: state.analytics.daily_sales(DAYS).await?,
    };

    Ok((StatusCode::OK, Json(report)))
}

/// Chart series: revenue per month over the last year
pub async fn monthly_sales_chart(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let series = state.analytics.monthly_sales(MONTHS).await?;
    Ok((StatusCode::OK, Json(series)))
}

/// Chart series: revenue per genre
pub async fn genre_sales_chart(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let series = state.analytics.sales_by_genre().await?;
    Ok((StatusCode::OK, Json(series)))
}
