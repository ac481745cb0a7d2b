mod assistant;
mod auth;
mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod middleware;
mod models;
mod profile;
mod routes;
mod state;
mod store;

use anyhow::Result;
use axum::http::{header, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assistant::remote::{GeminiGenerator, RemoteGenerator};
use crate::assistant::resolver::Assistant;
use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::middleware::RateLimiter;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{memory::MemoryStore, postgres::PgStore, Store};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting IVO API v{}", env!("CARGO_PKG_VERSION"));

    if config.uses_default_jwt_secret() {
        warn!("JWT_SECRET is not set; using the built-in development secret");
    }

    // Datastore: PostgreSQL when reachable, otherwise in-memory demo data
    let store = build_store(&config).await;
    info!("Datastore mode: {}", store.mode());

    // Assistant: remote fallback only with a usable Gemini key
    let assistant = Arc::new(Assistant::new(build_remote(&config)));
    if !assistant.remote_enabled() {
        info!("GEMINI_API_KEY not configured; assistant answers from the knowledge base only");
    }

    let rate_limiter = RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window);
    spawn_rate_limit_purge(rate_limiter.clone());

    // Build app state
    let state = AppState {
        store,
        assistant,
        tokens: TokenIssuer::new(&config.jwt_secret),
        rate_limiter,
        config: config.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn build_store(config: &Config) -> Arc<dyn Store> {
    let Some(url) = &config.database_url else {
        warn!("DATABASE_URL not set; running with the in-memory store");
        return Arc::new(MemoryStore::seeded());
    };

    match create_pool(url).await {
        Ok(pool) => Arc::new(PgStore::new(pool)),
        Err(e) => {
            warn!("Could not connect to PostgreSQL: {e:#}");
            warn!("Switching to in-memory mode");
            Arc::new(MemoryStore::seeded())
        }
    }
}

fn build_remote(config: &Config) -> Option<Arc<dyn RemoteGenerator>> {
    let api_key = config.gemini_api_key.clone()?;
    match LlmClient::new(api_key, config.gemini_model.clone(), config.gemini_timeout) {
        Ok(llm) => {
            let llm = match &config.gemini_api_base {
                Some(base) => llm.with_base_url(base.as_str()),
                None => llm,
            };
            info!(
                "LLM client initialized (model: {}, timeout: {}s)",
                llm.model(),
                config.gemini_timeout.as_secs()
            );
            Some(Arc::new(GeminiGenerator::new(llm)))
        }
        Err(e) => {
            warn!("Could not build LLM client, remote assistant disabled: {e}");
            None
        }
    }
}

/// Periodically drops elapsed rate-limit windows so the table stays bounded.
fn spawn_rate_limit_purge(limiter: RateLimiter) {
    tokio::spawn(async move {
        let period = limiter.window().max(std::time::Duration::from_secs(1));
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            limiter.purge_expired().await;
        }
    });
}
