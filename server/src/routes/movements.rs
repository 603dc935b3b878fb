//! Movement routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::patch,
    Json, Router,
};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::{
    handle_correct_movement, handle_reverse_movement, CorrectMovementBody, MovementResponse,
};
use crate::AppState;

/// Create movement routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/movements/{id}",
        patch(correct_handler).delete(reverse_handler),
    )
}

/// PATCH /movements/{id} - Correct a movement.
async fn correct_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    payload: std::result::Result<Json<CorrectMovementBody>, JsonRejection>,
) -> Result<Json<MovementResponse>> {
    let Json(body) = payload?;
    let response = handle_correct_movement(&*state.stock, &id, body).await?;
    Ok(Json(response))
}

/// DELETE /movements/{id} - Reverse a movement.
async fn reverse_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MovementResponse>> {
    let response = handle_reverse_movement(&*state.stock, &id).await?;
    Ok(Json(response))
}
