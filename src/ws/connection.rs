use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{
    RwLock,
    mpsc::{self, error::TrySendError},
};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        ConnectionStatus, ConnectionStatusData, MessageType, WebSocketMessage,
        notification::Notification,
    },
    services::notifier::NotificationSink,
};

/// Live admin dashboard connections
pub struct ConnectionManager {
    connections: RwLock<HashMap<Uuid, mpsc::Sender<Message>>>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    /// Create a new connection manager
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection
    pub async fn register(&self, id: Uuid, sender: mpsc::Sender<Message>) {
        let mut connections = self.connections.write().await;
        connections.insert(id, sender);
        tracing::info!("Registered dashboard connection {}", id);
    }

    /// Unregister a connection
    pub async fn unregister(&self, id: &Uuid) {
        let mut connections = self.connections.write().await;
        connections.remove(id);
        tracing::info!("Unregistered dashboard connection {}", id);
    }

    /// Send a message to a specific connection
    pub async fn send_to(&self, connection_id: &Uuid, message: impl Serialize) -> Result<()> {
        let message_json = serde_json::to_string(&message)?;
        let sender = {
            let connections = self.connections.read().await;
            connections.get(connection_id).cloned()
        };

        let sender = sender.ok_or_else(|| {
            AppError::Internal(format!("Connection {} not found", connection_id))
        })?;
        sender
            .try_send(Message::Text(message_json.into()))
            .map_err(|e| AppError::Internal(format!("Failed to send message: {}", e)))
    }

    /// Broadcast a message to all connections.
    ///
    /// Never waits on a client. A connection whose queue is full or closed is
    /// dropped from the registry, which closes its socket once the queued
    /// messages are flushed.
    pub async fn broadcast(&self, message: impl Serialize) -> Result<()> {
        let message_json = serde_json::to_string(&message)?;
        let mut dropped = Vec::new();

        {
            let connections = self.connections.read().await;
            for (id, sender) in connections.iter() {
                match sender.try_send(Message::Text(message_json.clone().into())) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!("Dashboard connection {} is not keeping up, dropping it", id);
                        dropped.push(*id);
                    }
                    Err(TrySendError::Closed(_)) => dropped.push(*id),
                }
            }
        }

        if !dropped.is_empty() {
            let mut connections = self.connections.write().await;
            for id in &dropped {
                connections.remove(id);
            }
        }

        Ok(())
    }

    /// Send a connection status update to a specific connection
    pub async fn send_connection_status(
        &self,
        connection_id: &Uuid,
        status: ConnectionStatus,
        unread_notifications: i64,
    ) -> Result<()> {
        let status_data = ConnectionStatusData {
            status,
            unread_notifications,
        };
        let message = WebSocketMessage::new(MessageType::ConnectionStatus, status_data);
        self.send_to(connection_id, message).await
    }

    /// Get the number of active connections
    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }
}

#[async_trait]
impl NotificationSink for ConnectionManager {
    async fn publish(&self, notification: &Notification) {
        let message = WebSocketMessage::new(MessageType::Notification, notification);
        if let Err(e) = self.broadcast(message).await {
            tracing::warn!("Failed to push notification {}: {}", notification.id, e);
        }
    }
}

/// Shared state for the connection manager
pub type SharedConnectionManager = Arc<ConnectionManager>;

/// Messages queued per dashboard before it counts as stalled
const QUEUE_CAPACITY: usize = 100;

/// Queue a reply while the connection is still registered. A full queue
/// skips the reply; false means the connection is gone.
fn reply(replies: &mpsc::WeakSender<Message>, message: Message) -> bool {
    let Some(sender) = replies.upgrade() else {
        return false;
    };
    !matches!(sender.try_send(message), Err(TrySendError::Closed(_)))
}

/// Serve one dashboard socket until either side closes it
pub async fn handle_socket(
    socket: WebSocket,
    connection_manager: SharedConnectionManager,
    unread_notifications: i64,
) {
    let connection_id = Uuid::new_v4();
    tracing::info!("New dashboard websocket connection: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();

    // Channel for messages to this client. The registry owns the only
    // strong sender, so dropping the connection from it ends the socket.
    let (tx, mut rx) = mpsc::channel::<Message>(QUEUE_CAPACITY);
    let replies = tx.downgrade();

    connection_manager.register(connection_id, tx).await;

    if let Err(e) = connection_manager
        .send_connection_status(&connection_id, ConnectionStatus::Connected, unread_notifications)
        .await
    {
        tracing::error!("Error sending connection status: {}", e);
    }

    // Task to forward messages from the channel to the WebSocket
    let mut forward_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = sender.send(message).await {
                tracing::error!("Error sending WebSocket message: {}", e);
                break;
            }
        }
    });

    // Task to handle incoming messages
    let mut receive_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    tracing::debug!("Received message: {}", text.as_str());
                    if text.as_str().contains("\"ping\"") {
                        let pong = WebSocketMessage::new(MessageType::Pong, ());
                        match serde_json::to_string(&pong) {
                            Ok(json) => {
                                if !reply(&replies, Message::Text(json.into())) {
                                    break;
                                }
                            }
                            Err(e) => tracing::error!("Error encoding pong: {}", e),
                        }
                    }
                }
                Ok(Message::Ping(data)) => {
                    if !reply(&replies, Message::Pong(data)) {
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Dashboard client disconnected");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }

    connection_manager.unregister(&connection_id).await;
    tracing::info!("WebSocket connection closed: {}", connection_id);
}
