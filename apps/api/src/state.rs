use std::sync::Arc;

use crate::assistant::resolver::Assistant;
use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::middleware::RateLimiter;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Memory or PostgreSQL, chosen once at startup.
    pub store: Arc<dyn Store>,
    /// Chat resolver. Holds the remote generator only when a usable Gemini key is set.
    pub assistant: Arc<Assistant>,
    pub tokens: TokenIssuer,
    pub rate_limiter: RateLimiter,
    pub config: Config,
}
