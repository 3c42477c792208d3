use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use forum_types::api::{Claims, ErrorBody};

use crate::AppState;

/// The raw bearer token of the current request, kept so it can be forwarded
/// to the backend on the caller's behalf.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Extract and validate the JWT from the Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match bearer(&req) {
        Some(token) => token.to_string(),
        None => return unauthorized(),
    };

    let claims = match decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            return unauthorized();
        }
    };

    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(BearerToken(token));
    next.run(req).await
}

fn bearer(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody::msg("Authentication invalid")),
    )
        .into_response()
}
