//! WebSocket message protocol definitions.
//!
//! All messages are JSON-encoded and use snake_case for field names. Item
//! payloads keep the camelCase shape of the HTTP API.

use serde::{Deserialize, Serialize};
use tally_engine::Item;

/// Messages sent from client to server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Restrict alerts to the given items. `null` watches every item.
    Watch {
        #[serde(default)]
        item_ids: Option<Vec<String>>,
        /// Request ID for correlating responses
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Keep-alive ping.
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// An item landed at or below its minimum.
    LowStock {
        /// Committed item snapshot
        item: Item,
    },

    /// Acknowledges a watch request.
    Watching {
        /// Watched item IDs, or `None` for every item
        #[serde(skip_serializing_if = "Option::is_none")]
        item_ids: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    /// Response to ping.
    Pong,

    /// Error message.
    Error {
        /// Error description
        message: String,
        /// Request ID from the original request (if applicable)
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

impl ServerMessage {
    /// Create an error message.
    pub fn error(message: impl Into<String>, request_id: Option<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            request_id,
        }
    }

    /// Create a low_stock push notification.
    pub fn low_stock(item: Item) -> Self {
        ServerMessage::LowStock { item }
    }
}
