pub mod admin;
pub mod analytics;
pub mod book;
pub mod cart;
pub mod message;
pub mod money;
pub mod notification;
pub mod order;

pub use message::{ConnectionStatus, ConnectionStatusData, MessageType, WebSocketMessage};
