//! WebSocket upgrade route.

use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
    routing::get,
    Router,
};

use crate::auth::AuthUser;
use crate::handlers::handle_websocket_connection;
use crate::AppState;

/// Create WebSocket routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(upgrade_handler))
}

/// GET /ws - Subscribe to low-stock alerts.
async fn upgrade_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ws: WebSocketUpgrade,
) -> Response {
    let conn_manager = Arc::clone(&state.conn_manager);
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, conn_manager, auth.client_id))
}
