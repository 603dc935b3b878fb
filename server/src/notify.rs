//! Low-stock notification delivery.
//!
//! The stock service calls a [`ThresholdNotifier`] after a unit of work has
//! committed and its item landed at or below its minimum. Delivery is
//! fire-and-forget: implementations must not block and have no way to fail
//! the caller.

use std::sync::Arc;

use tally_engine::Item;

use crate::websocket::{ConnectionManager, ServerMessage};

/// Receives committed item snapshots that crossed their low-stock minimum.
pub trait ThresholdNotifier: Send + Sync {
    fn notify(&self, item: &Item);
}

impl<T: ThresholdNotifier + ?Sized> ThresholdNotifier for Arc<T> {
    fn notify(&self, item: &Item) {
        (**self).notify(item)
    }
}

/// Pushes low-stock alerts to connected WebSocket clients.
#[derive(Debug, Clone)]
pub struct LowStockBroadcaster {
    conn_manager: Arc<ConnectionManager>,
}

impl LowStockBroadcaster {
    pub fn new(conn_manager: Arc<ConnectionManager>) -> Self {
        Self { conn_manager }
    }
}

impl ThresholdNotifier for LowStockBroadcaster {
    fn notify(&self, item: &Item) {
        tracing::warn!(
            item_id = %item.id,
            quantity = item.quantity,
            minimum = ?item.minimum,
            "Item at or below minimum stock"
        );

        let sent = self
            .conn_manager
            .broadcast_low_stock(&item.id, ServerMessage::low_stock(item.clone()));

        tracing::debug!(item_id = %item.id, recipients = sent, "Low-stock alert dispatched");
    }
}
