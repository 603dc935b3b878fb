//! WebSocket support for low-stock alerts.
//!
//! Clients connect via WebSocket, optionally narrow the set of items they
//! watch, and receive a push notification whenever a committed movement
//! leaves an item at or below its minimum.

mod manager;
mod protocol;

pub use manager::ConnectionManager;
pub use protocol::*;
