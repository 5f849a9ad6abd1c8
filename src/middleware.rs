use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use tracing::warn;

use crate::error::AppError;
use crate::AppState;

/// The owner id of an authenticated request, resolved from a Bearer token.
pub struct Identity(pub String);

impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(owner_id) = bearer_owner(parts, state)? {
            return Ok(Identity(owner_id));
        }

        warn!("unauthorized boards access attempt");
        Err(AppError::Unauthorized)
    }
}

fn bearer_owner(parts: &Parts, state: &AppState) -> Result<Option<String>, AppError> {
    if let Some(auth_header) = parts.headers.get(AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return state.repo.find_token_owner(token);
            }
        }
    }
    Ok(None)
}
