use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::Result,
    models::notification::{NotificationListParams, UnreadCount},
    state::AppState,
};

const DEFAULT_LIST_LIMIT: i64 = 50;

pub async fn list_notifications(
    State(state): State<AppState>,
    Query(params): Query<NotificationListParams>,
) -> Result<impl IntoResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT).max(1);
    let notifications = state.notifier.store().recent(limit).await?;

    Ok((StatusCode::OK, Json(notifications)))
}

/// Marking an already read notification again is not an error
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.notifier.store().mark_read(id).await?;
    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}

pub async fn unread_count(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let count = state.notifier.store().unread_count().await?;
    Ok((StatusCode::OK, Json(UnreadCount { count })))
}
