use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Top-level application error. The `IntoResponse` impl below is the only
/// place where error kinds are mapped to HTTP status codes.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Client errors ────────────────────────────────────────────────────────
    #[error("No conversation found")]
    ConversationNotFound,

    /// The conversation exists but has no saved transcript yet.
    #[error("No conversation found")]
    LogNotFound,

    #[error("Invalid voting option")]
    InvalidVote { vote: String },

    #[error("Missing comment")]
    MissingComment,

    #[error("Unauthorized")]
    Unauthorized,

    // ── Responder errors ─────────────────────────────────────────────────────
    #[error("Ollama service unavailable at {host}")]
    OllamaUnavailable { host: String },

    #[error("Model '{model_name}' not found in Ollama")]
    ModelNotFound { model_name: String },

    #[error("Inference error: {message}")]
    InferenceError { message: String },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io { context: context.into(), source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::ConversationNotFound | AppError::LogNotFound)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::InvalidVote { .. } | AppError::MissingComment)
    }

    pub fn status(&self) -> StatusCode {
        if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else if matches!(self, AppError::Unauthorized) {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("Request failed: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(AppError::ConversationNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::LogNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InvalidVote { vote: "sideways".into() }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::MissingComment.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn everything_else_is_a_server_error() {
        let io = AppError::io("Failed to write log", std::io::Error::other("disk full"));
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::OllamaUnavailable { host: "http://localhost:11434".into() }.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let response = AppError::Unexpected("secret".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }
}
