use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio_util::io::ReaderStream;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{CommentRequest, StatusResponse};
use crate::AppState;

/// Routes mounted under `/api/recording`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start_handler))
        .route("/stop", post(stop_handler))
        .route("/status", get(status_handler))
        .route("/vote/{vote}", post(vote_handler))
        .route("/comment", post(comment_handler))
        .route("/save", post(save_handler))
        .route("/log", get(log_handler))
}

/// POST `/start`
pub async fn start_handler(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, AppError> {
    state.recording.start(&user.name).await?;
    Ok(Json(StatusResponse::ok()))
}

/// POST `/stop`
pub async fn stop_handler(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, AppError> {
    state.recording.stop(&user.name).await?;
    Ok(Json(StatusResponse::ok()))
}

/// GET `/status` — `{"status": "on" | "off"}`
pub async fn status_handler(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, AppError> {
    let on = state.recording.status(&user.name).await?;
    Ok(Json(StatusResponse { status: if on { "on" } else { "off" } }))
}

/// POST `/vote/{vote}` with `up` or `down`
pub async fn vote_handler(
    user: AuthUser,
    Path(vote): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, AppError> {
    state.recording.vote(&user.name, &vote).await?;
    Ok(Json(StatusResponse::ok()))
}

/// POST `/comment` with `{"comment": "..."}`. A missing or unparseable body
/// is treated as a missing comment.
pub async fn comment_handler(
    user: AuthUser,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusResponse>, AppError> {
    let request: CommentRequest = serde_json::from_slice(&body).unwrap_or_default();
    state.recording.comment(&user.name, request.comment.as_deref()).await?;
    Ok(Json(StatusResponse::ok()))
}

/// POST `/save` — responds once the log is on disk.
pub async fn save_handler(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, AppError> {
    state.recording.save(&user.name).await?;
    Ok(Json(StatusResponse::ok()))
}

/// GET `/log` — streams the saved transcript as a text attachment.
pub async fn log_handler(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let (conversation_id, path) = state.recording.log(&user.name).await?;
    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::LogNotFound
        } else {
            AppError::io(format!("Failed to open {}", path.display()), e)
        }
    })?;

    let disposition = format!("attachment; filename=\"log-{conversation_id}.txt\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::agent::Responder;
    use crate::engine::{Engine, Exchange};
    use crate::models::{ChatMessage, UserCommand};

    struct Parrot;

    #[async_trait]
    impl Responder for Parrot {
        async fn respond(
            &self,
            _conversation_id: &str,
            _history: &[Exchange],
            command: &UserCommand,
        ) -> Result<Vec<ChatMessage>, AppError> {
            Ok(vec![ChatMessage::text(command.describe())])
        }
    }

    fn test_state(log_dir: &std::path::Path) -> AppState {
        let engine = Arc::new(Engine::new(Arc::new(Parrot), log_dir));
        AppState::new(engine, [("tok".to_string(), "alice".to_string())].into())
    }

    fn app(state: AppState) -> Router {
        Router::new().nest("/api/recording", router()).with_state(state)
    }

    async fn call(router: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", "Bearer tok")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(req).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn every_route_is_404_without_a_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        for (method, uri, body) in [
            ("POST", "/api/recording/start", ""),
            ("POST", "/api/recording/stop", ""),
            ("GET", "/api/recording/status", ""),
            ("POST", "/api/recording/vote/up", ""),
            ("POST", "/api/recording/comment", r#"{"comment":"nice"}"#),
            ("POST", "/api/recording/save", ""),
            ("GET", "/api/recording/log", ""),
        ] {
            let (status, json) = call(app(state.clone()), method, uri, body).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
            assert_eq!(json["error"], "No conversation found", "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn validation_happens_before_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let (status, json) = call(app(state.clone()), "POST", "/api/recording/vote/sideways", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid voting option");

        let (status, json) = call(app(state), "POST", "/api/recording/comment", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing comment");
    }

    #[tokio::test]
    async fn start_status_stop() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        state.converse.connect("alice").await;

        let (_, json) = call(app(state.clone()), "GET", "/api/recording/status", "").await;
        assert_eq!(json["status"], "off");
        let (status, json) = call(app(state.clone()), "POST", "/api/recording/start", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        let (_, json) = call(app(state.clone()), "GET", "/api/recording/status", "").await;
        assert_eq!(json["status"], "on");
        call(app(state.clone()), "POST", "/api/recording/stop", "").await;
        let (_, json) = call(app(state), "GET", "/api/recording/status", "").await;
        assert_eq!(json["status"], "off");
    }

    /// Replies only after `release` is notified.
    struct Stalled {
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl Responder for Stalled {
        async fn respond(
            &self,
            _conversation_id: &str,
            _history: &[Exchange],
            _command: &UserCommand,
        ) -> Result<Vec<ChatMessage>, AppError> {
            self.release.notified().await;
            Ok(vec![ChatMessage::text("done")])
        }
    }

    #[tokio::test]
    async fn status_answers_while_a_command_is_running() {
        let dir = tempfile::tempdir().unwrap();
        let stalled = Arc::new(Stalled { release: tokio::sync::Notify::new() });
        let engine = Arc::new(Engine::new(stalled.clone(), dir.path()));
        let state = AppState::new(engine, [("tok".to_string(), "alice".to_string())].into());
        let (conversation, _) = state.converse.connect("alice").await;

        let running = tokio::spawn(async move {
            conversation.handle_command(UserCommand::Command { text: "slow".into() }).await
        });
        tokio::task::yield_now().await;

        let (status, json) = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            call(app(state), "GET", "/api/recording/status", ""),
        )
        .await
        .expect("status waited for the responder");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "off");

        stalled.release.notify_one();
        assert!(running.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let dir = tempfile::tempdir().unwrap();
        let req = Request::builder()
            .method("GET")
            .uri("/api/recording/status")
            .body(Body::empty())
            .unwrap();
        let response = app(test_state(dir.path())).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn log_is_served_as_attachment_after_save() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let (conversation, _) = state.converse.connect("alice").await;
        conversation.start_recording().await;
        conversation
            .handle_command(UserCommand::Command { text: "hello".into() })
            .await
            .unwrap();

        let (status, _) = call(app(state.clone()), "GET", "/api/recording/log", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(app(state.clone()), "POST", "/api/recording/save", "").await;
        assert_eq!(status, StatusCode::OK);

        let req = Request::builder()
            .uri("/api/recording/log")
            .header("authorization", "Bearer tok")
            .body(Body::empty())
            .unwrap();
        let response = app(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            format!("attachment; filename=\"log-{}.txt\"", conversation.id()).as_str()
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let saved = std::fs::read(conversation.log().await.unwrap()).unwrap();
        assert_eq!(body.as_ref(), saved.as_slice());
        assert!(String::from_utf8_lossy(&body).contains("U: hello\nA: hello\n"));
    }
}
