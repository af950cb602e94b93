use std::sync::Arc;

use tracing::info;

use assistant_web::agent::OllamaResponder;
use assistant_web::config::Config;
use assistant_web::engine::Engine;
use assistant_web::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assistant_web=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let responder = OllamaResponder::new(&config.ollama_base_url, &config.ollama_model)?;
    let engine = Arc::new(Engine::new(Arc::new(responder), &config.log_dir));
    let state = AppState::new(engine, config.access_tokens.clone());

    info!(
        "Using Ollama model {} at {}, saving logs to {}",
        config.ollama_model,
        config.ollama_base_url,
        config.log_dir.display()
    );

    let app = build_router(state, config.static_dir.as_deref());

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, app).await?;
    Ok(())
}
