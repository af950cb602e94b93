use axum::extract::State;
use axum::Json;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{ConverseRequest, ConverseResponse};
use crate::AppState;

/// POST `/api/converse` — runs one command and returns the numbered replies.
pub async fn converse_handler(
    user: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<ConverseRequest>,
) -> Result<Json<ConverseResponse>, AppError> {
    let response = state.converse.converse(&user.name, request.command).await?;
    Ok(Json(response))
}
