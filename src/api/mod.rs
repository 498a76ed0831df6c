//! HTTP API for the forge companion service.
//!
//! Serves the agent catalog, per-persona tool invocation, session
//! persistence, and a health probe. The server holds one [`AgentSet`]
//! (tool registries on the write and review credentials) and one
//! session store, both shared across requests through [`AppState`].

pub mod agents;
pub mod sessions;
pub mod types;

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agents::AgentSet;
use crate::config::{Config, LlmConfig};
use crate::session::{create_session_store, SessionStore};

use types::HealthResponse;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Personas and their credential-scoped tool registries
    pub agents: Arc<AgentSet>,

    /// Session document store
    pub sessions: Arc<dyn SessionStore>,

    /// Model configuration reported on agent cards
    pub llm: LlmConfig,
}

/// GET /health - liveness probe.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            allowed_origins.iter().filter_map(|origin| origin.parse().ok()),
        ))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the router with all routes and middleware attached.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/agents", get(agents::list_agents))
        .route("/api/agents/:name", get(agents::get_agent))
        .route("/api/agents/:name/tools", get(agents::list_agent_tools))
        .route(
            "/api/agents/:name/tools/:tool",
            post(agents::invoke_agent_tool),
        )
        .route("/api/sessions", post(sessions::create_session))
        .route(
            "/api/sessions/:id",
            get(sessions::get_session)
                .put(sessions::put_session)
                .delete(sessions::delete_session),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

/// Build the application state and serve the API until shutdown.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let agents = Arc::new(AgentSet::new(&config)?);
    let sessions = create_session_store(&config.session).map_err(|e| anyhow::anyhow!(e))?;
    let state = AppState {
        agents,
        sessions,
        llm: config.llm.clone(),
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = router(state, &config.server.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    use crate::session::MemorySessionStore;

    let config = Config::new(
        "https://gitlab.example.com".to_string(),
        "test-token".to_string(),
    );
    AppState {
        agents: Arc::new(AgentSet::new(&config).expect("agent set builds offline")),
        sessions: Arc::new(MemorySessionStore::new()),
        llm: config.llm,
    }
}
