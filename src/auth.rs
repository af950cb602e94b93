use std::collections::HashMap;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Uri};
use tracing::warn;

use crate::errors::AppError;
use crate::AppState;

/// The authenticated caller of an `/api` route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub name: String,
}

/// Extracts the access token from `Authorization: Bearer <token>`, falling
/// back to the `access_token` query parameter for WebSocket upgrades.
pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    if let Some(auth) = headers.get("authorization") {
        if let Ok(auth_str) = auth.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    let Query(mut params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params.remove("access_token")
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers, &parts.uri).ok_or(AppError::Unauthorized)?;
        match state.access_tokens.get(&token) {
            Some(name) => Ok(AuthUser { name: name.clone() }),
            None => {
                warn!("Rejected request to {} with unknown access token", parts.uri.path());
                Err(AppError::Unauthorized)
            }
        }
    }
}
