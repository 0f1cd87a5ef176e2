use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::Result,
    models::{
        notification::NewNotification,
        order::{OrderStatus, StatusUpdateRequest},
    },
    state::AppState,
};

/// All orders, newest first
pub async fn list_orders(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let orders = state.orders.list(None).await?;
    Ok((StatusCode::OK, Json(orders)))
}

pub async fn order_detail(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse> {
    let detail = state.orders.find(&order_id).await?;
    Ok((StatusCode::OK, Json(detail)))
}

/// Move an order to a new status and tell the dashboard about it
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse> {
    let status: OrderStatus = request.status.parse()?;
    let order = state.orders.update_status(&order_id, status).await?;

    tracing::info!("Order {} is now {}", order.order_id, status);
    state
        .notifier
        .record(NewNotification::order_updated(&order.order_id, status.label()))
        .await;

    Ok((StatusCode::OK, Json(order)))
}
