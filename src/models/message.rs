use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message types pushed to admin dashboard sockets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Connection status update to client
    ConnectionStatus,
    /// A notification was recorded
    Notification,
    /// Reply to a client ping
    Pong,
}

/// WebSocket message structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage<T> {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub data: T,
    /// Timestamp when the message was created
    pub timestamp: DateTime<Utc>,
    pub id: Uuid,
}

impl<T> WebSocketMessage<T> {
    pub fn new(kind: MessageType, data: T) -> Self {
        Self {
            kind,
            data,
            timestamp: Utc::now(),
            id: Uuid::new_v4(),
        }
    }
}

/// Connection status message sent to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatusData {
    pub status: ConnectionStatus,
    pub unread_notifications: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}
