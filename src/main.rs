//! Forge Companion - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the agent catalog, tool
//! invocation, and session APIs. Run with `--validate` to check the
//! environment configuration and exit.

use forge_companion::api;
use forge_companion::config::{validate_environment, Config};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    if std::env::args().any(|arg| arg == "--validate") {
        let report = validate_environment();
        println!("{}", report.render());
        std::process::exit(if report.ok { 0 } else { 1 });
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forge_companion=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: gitlab={} model={}",
        config.gitlab.url, config.llm.model
    );
    if !config.gitlab.has_isolated_review_token() {
        warn!(
            "REVIEW_GITLAB_TOKEN is not set or equals GITLAB_PRIVATE_TOKEN; \
             the reviewer persona will act with the write credential"
        );
    }

    // Start HTTP server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    api::serve(config).await?;

    Ok(())
}
