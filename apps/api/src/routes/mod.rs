pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, StatusCode},
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::assistant::handlers as assistant;
use crate::auth::handlers as auth;
use crate::jobs::handlers as jobs;
use crate::middleware::{json_guard, rate_limit};
use crate::profile::handlers as profile;
use crate::profile::upload::UPLOAD_URL_PREFIX;
use crate::state::AppState;

/// Avatar uploads may be larger than the JSON cap.
const MAX_UPLOAD_BODY: usize = 5 * 1024 * 1024;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' https://www.googletagmanager.com https://www.google-analytics.com; \
    style-src 'self' 'unsafe-inline' https://cdnjs.cloudflare.com https://fonts.googleapis.com; \
    img-src 'self' data: https://placehold.co https://www.google-analytics.com; \
    font-src 'self' https://cdnjs.cloudflare.com https://fonts.gstatic.com; \
    connect-src 'self' https://www.google-analytics.com https://www.googletagmanager.com";

async fn api_not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "API Endpoint Not Found" })),
    )
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/auth/signup", post(auth::handle_signup))
        .route("/auth/login", post(auth::handle_login))
        // Profiles
        .route(
            "/profile",
            patch(profile::handle_update_profile).layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY)),
        )
        .route("/profile/me", get(profile::handle_get_me))
        .route(
            "/profile/professionals",
            get(profile::handle_list_professionals),
        )
        .route("/profile/:id", get(profile::handle_get_professional))
        // Jobs
        .route(
            "/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        // Assistant
        .route("/ai/chat", post(assistant::handle_chat))
        .fallback(api_not_found)
}

pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .nest("/api", api_router())
        .nest_service(UPLOAD_URL_PREFIX, uploads)
        .fallback_service(static_files)
        .layer(middleware::from_fn(json_guard))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit,
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .with_state(state)
}
