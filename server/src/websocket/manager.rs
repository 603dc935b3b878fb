//! WebSocket connection manager.
//!
//! Tracks active WebSocket connections, the items each one watches, and
//! fans low-stock alerts out to the interested clients.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::ServerMessage;

/// Sender for WebSocket messages.
pub type MessageSender = mpsc::UnboundedSender<ServerMessage>;

/// A single WebSocket connection.
#[derive(Debug)]
pub struct Connection {
    /// Identity the client authenticated with
    pub client_id: String,
    /// Channel to send messages to this connection
    pub sender: MessageSender,
    /// Watched item IDs; `None` means every item
    pub watching: Option<HashSet<String>>,
}

impl Connection {
    fn watches(&self, item_id: &str) -> bool {
        self.watching
            .as_ref()
            .map_or(true, |ids| ids.contains(item_id))
    }
}

/// Manages active WebSocket connections.
///
/// Thread-safe and can be shared across handlers via `Arc`.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    /// All active connections, keyed by connection ID.
    connections: DashMap<String, Connection>,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Create a new connection manager wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection watching every item.
    ///
    /// Returns the connection ID.
    pub fn register(&self, client_id: String, sender: MessageSender) -> String {
        let conn_id = uuid::Uuid::new_v4().to_string();

        let connection = Connection {
            client_id,
            sender,
            watching: None,
        };

        self.connections.insert(conn_id.clone(), connection);

        tracing::info!(conn_id = %conn_id, "WebSocket connection registered");

        conn_id
    }

    /// Unregister a connection.
    pub fn unregister(&self, conn_id: &str) {
        if let Some((_, conn)) = self.connections.remove(conn_id) {
            tracing::info!(conn_id = %conn_id, client_id = %conn.client_id, "WebSocket connection unregistered");
        }
    }

    /// Replace the watch filter of a connection.
    ///
    /// Returns false if the connection is gone.
    pub fn set_watch(&self, conn_id: &str, item_ids: Option<Vec<String>>) -> bool {
        match self.connections.get_mut(conn_id) {
            Some(mut conn) => {
                conn.watching = item_ids.map(|ids| ids.into_iter().collect());
                true
            }
            None => false,
        }
    }

    /// Send a low-stock alert to every connection watching `item_id`.
    ///
    /// Returns the number of connections that received the message.
    pub fn broadcast_low_stock(&self, item_id: &str, message: ServerMessage) -> usize {
        let mut sent_count = 0;

        for entry in self.connections.iter() {
            let conn = entry.value();
            if !conn.watches(item_id) {
                continue;
            }
            if conn.sender.send(message.clone()).is_ok() {
                sent_count += 1;
            } else {
                tracing::debug!(
                    conn_id = %entry.key(),
                    client_id = %conn.client_id,
                    "Skipping closed WebSocket channel"
                );
            }
        }

        sent_count
    }

    /// Send a message to a specific connection.
    pub fn send_to(&self, conn_id: &str, message: ServerMessage) -> bool {
        match self.connections.get(conn_id) {
            Some(conn) => conn.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Get the number of active connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
