//! Request handlers for items and stock movements.

mod items;
mod movements;
mod websocket;

pub use items::*;
pub use movements::*;
pub use websocket::handle_websocket_connection;
