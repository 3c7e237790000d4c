use crate::auth::token::Claims;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

/// Verified identity of the caller, inserted as a request extension for
/// handlers behind [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub claims: Claims,
}

fn unauthorized(description: &str) -> Response {
    let body = json!({
        "error": "invalid_token",
        "error_description": description,
    });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// Bearer-token guard. Expects `Authorization: Bearer <jwt>`, verifies the
/// signature and expiry against the configured public key, and forwards the
/// claims to the handler.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = match request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        Some(value) => value,
        None => return unauthorized("Authorization header is required"),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(token) => token,
        None => return unauthorized("Authorization header must be 'Bearer <token>'"),
    };

    let claims = match state.token_issuer.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("token rejected: {}", e);
            return unauthorized("The access token is invalid or has expired");
        }
    };

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        email: claims.email.clone(),
        claims,
    });

    next.run(request).await
}
