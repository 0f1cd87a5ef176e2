use axum::{
    extract::{State, ws::WebSocketUpgrade},
    response::IntoResponse,
};

use crate::{error::Result, state::AppState, ws::handle_socket};

/// Upgrade an authenticated admin to the live notification feed
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let unread = state.notifier.store().unread_count().await?;
    let connections = state.connections.clone();

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, connections, unread)))
}
