//! Authentication middleware.
//!
//! A shared-password gate: when `AUTH_SECRET` is configured, mutating routes
//! require `Authorization: Bearer <secret>`. Without a secret every request
//! is accepted anonymously.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};

use crate::AppState;

/// Client identity used when no secret is configured.
const ANONYMOUS: &str = "anonymous";

/// Authenticated caller extracted from request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Identity used for logging and WebSocket bookkeeping
    pub client_id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        authorize(auth_header, state.config.auth_secret.as_deref())
    }
}

/// Check an `Authorization` header against the configured secret.
fn authorize(
    header: Option<&str>,
    secret: Option<&str>,
) -> Result<AuthUser, (StatusCode, &'static str)> {
    let Some(secret) = secret else {
        return Ok(AuthUser {
            client_id: ANONYMOUS.to_string(),
        });
    };

    match header {
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) if token == secret => Ok(AuthUser {
                client_id: format!("client-{}", uuid::Uuid::new_v4()),
            }),
            Some(_) => {
                tracing::warn!("Rejected request with wrong bearer token");
                Err((StatusCode::UNAUTHORIZED, "Invalid bearer token"))
            }
            None => Err((
                StatusCode::UNAUTHORIZED,
                "Invalid authorization header format",
            )),
        },
        None => Err((StatusCode::UNAUTHORIZED, "Missing authorization header")),
    }
}
