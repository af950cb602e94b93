pub mod agent;
pub mod auth;
pub mod config;
pub mod engine;
pub mod errors;
pub mod models;
pub mod routes;
pub mod service;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::extract::Request;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::engine::Engine;
use crate::routes::api_routes::converse_handler;
use crate::routes::recording_routes;
use crate::routes::ws_routes::ws_conversation_handler;
use crate::service::converse_service::ConverseService;
use crate::service::recording_service::RecordingService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub converse: ConverseService,
    pub recording: RecordingService,
    /// token → user name
    pub access_tokens: Arc<HashMap<String, String>>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>, access_tokens: HashMap<String, String>) -> Self {
        Self {
            converse: ConverseService::new(engine.clone()),
            recording: RecordingService::new(engine),
            access_tokens: Arc::new(access_tokens),
        }
    }
}

/// Builds the application router. When `static_dir` is given, the built
/// frontend is served for every path not matched by the API.
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/api/conversation", get(ws_conversation_handler))
        .route("/api/converse", post(converse_handler))
        .nest("/api/recording", recording_routes::router());

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Request span without the query string, which may carry an access token.
fn request_span(request: &Request) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::agent::Responder;
    use crate::engine::Exchange;
    use crate::errors::AppError;
    use crate::models::{ChatMessage, UserCommand};

    struct Silent;

    #[async_trait]
    impl Responder for Silent {
        async fn respond(
            &self,
            _conversation_id: &str,
            _history: &[Exchange],
            _command: &UserCommand,
        ) -> Result<Vec<ChatMessage>, AppError> {
            Ok(Vec::new())
        }
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn request_logs_omit_query_tokens() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer({
                let captured = captured.clone();
                move || captured.clone()
            })
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(Engine::new(Arc::new(Silent), dir.path()));
        let state = AppState::new(engine, [("SECRET-TOKEN".to_string(), "bob".to_string())].into());
        let request = axum::http::Request::builder()
            .uri("/api/recording/log?access_token=SECRET-TOKEN")
            .body(Body::empty())
            .unwrap();
        let response = build_router(state, None).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("path=/api/recording/log"), "{out}");
        assert!(!out.contains("SECRET-TOKEN"), "{out}");
    }
}
