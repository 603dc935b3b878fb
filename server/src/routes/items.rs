//! Item routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tally_engine::{Item, NewItem};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::{
    handle_apply_movement, handle_delete_item, handle_get_item, handle_list_items,
    handle_list_movements, handle_register_item, ApplyMovementBody, MovementHistory,
    MovementResponse,
};
use crate::AppState;

/// Create item routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_handler).post(register_handler))
        .route("/items/{id}", get(get_handler).delete(delete_handler))
        .route(
            "/items/{id}/movements",
            get(history_handler).post(apply_handler),
        )
}

/// POST /items - Register an item.
async fn register_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    payload: std::result::Result<Json<NewItem>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>)> {
    let Json(request) = payload?;
    let item = handle_register_item(&state.pool, request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /items - List items.
async fn list_handler(State(state): State<AppState>) -> Result<Json<Vec<Item>>> {
    Ok(Json(handle_list_items(&state.pool).await?))
}

/// GET /items/{id} - Fetch one item.
async fn get_handler(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Item>> {
    Ok(Json(handle_get_item(&state.pool, &id).await?))
}

/// DELETE /items/{id} - Delete an item and its movements.
async fn delete_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    handle_delete_item(&*state.stock, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /items/{id}/movements - Movement history.
async fn history_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MovementHistory>> {
    Ok(Json(handle_list_movements(&state.pool, &id).await?))
}

/// POST /items/{id}/movements - Apply a movement.
async fn apply_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    payload: std::result::Result<Json<ApplyMovementBody>, JsonRejection>,
) -> Result<(StatusCode, Json<MovementResponse>)> {
    let Json(body) = payload?;
    let response = handle_apply_movement(&*state.stock, &id, body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
