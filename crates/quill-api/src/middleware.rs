use std::convert::Infallible;

use axum::Json;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use quill_types::api::Claims;

use crate::AppState;
use crate::token;

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Required posture: reject with 403 unless a valid bearer token is
/// presented. On success the decoded claim rides in the request
/// extensions.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match bearer_token(&req).and_then(|t| token::verify(t, &state.jwt_secret)) {
        Some(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        None => (
            StatusCode::FORBIDDEN,
            Json(json!({ "message": "not authorized" })),
        )
            .into_response(),
    }
}

/// Optional posture: attach the claim when a valid token is present,
/// proceed anonymously otherwise.
pub async fn optional_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Some(claims) = bearer_token(&req).and_then(|t| token::verify(t, &state.jwt_secret)) {
        req.extensions_mut().insert(claims);
    }
    next.run(req).await
}

/// Extractor for routes behind the optional posture: the claim if the
/// middleware attached one, `None` for an anonymous caller.
pub struct MaybeClaims(pub Option<Claims>);

impl<S> FromRequestParts<S> for MaybeClaims
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Infallible> {
        Ok(MaybeClaims(parts.extensions.get::<Claims>().cloned()))
    }
}
