//! Cross-cutting request middleware: per-IP rate limiting and the JSON body guard.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Request, State},
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    middleware::Next,
    response::Response,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::errors::AppError;

/// Maximum JSON body size: 10 KiB
pub const MAX_JSON_BODY: usize = 10 * 1024;

static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("script pattern is valid")
});
static INLINE_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"on\w+="[^"]*""#).expect("handler pattern is valid"));

struct Window {
    count: u32,
    started: Instant,
}

/// Fixed-window request counter keyed by client IP.
///
/// The first request opens a window; every request inside it increments the count
/// and requests past `max_requests` are rejected. The first request after the window
/// elapses starts a new one.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, Window>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records a request from `client` and reports whether it is allowed.
    pub async fn check(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        let entry = windows.entry(client.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(entry.started) > self.window {
            entry.count = 0;
            entry.started = now;
        }
        entry.count += 1;

        entry.count <= self.max_requests
    }

    /// Drops windows that have fully elapsed. Called periodically from `main`.
    pub async fn purge_expired(&self) {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        windows.retain(|_, w| now.duration_since(w.started) <= self.window);
        debug!("Rate limiter purge: {} active clients", windows.len());
    }

    #[cfg(test)]
    pub async fn tracked_clients(&self) -> usize {
        self.windows.lock().await.len()
    }
}

/// Rejects clients over their request budget with 429.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_addr(&request);
    if !limiter.check(&client).await {
        warn!("Rate limit exceeded for {client}");
        return Err(AppError::TooManyRequests);
    }
    Ok(next.run(request).await)
}

/// First `X-Forwarded-For` entry, else the socket peer, else `"unknown"`.
fn client_addr(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next().map(str::trim) {
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Caps JSON bodies at [`MAX_JSON_BODY`] and strips script blocks and inline
/// event handlers from top-level string fields. Other content types pass through.
pub async fn json_guard(request: Request, next: Next) -> Result<Response, AppError> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);
    if !is_json {
        return Ok(next.run(request).await);
    }

    let (mut parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_JSON_BODY)
        .await
        .map_err(|_| AppError::PayloadTooLarge)?;

    let bytes = sanitize_json_body(bytes);
    parts.headers.remove(CONTENT_LENGTH);

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// Rewrites top-level string values of a JSON object. Anything else is returned untouched.
fn sanitize_json_body(bytes: Bytes) -> Bytes {
    let Ok(Value::Object(mut map)) = serde_json::from_slice::<Value>(&bytes) else {
        return bytes;
    };

    let mut changed = false;
    for value in map.values_mut() {
        if let Value::String(text) = value {
            let cleaned = sanitize_text(text);
            if cleaned != *text {
                *text = cleaned;
                changed = true;
            }
        }
    }
    if !changed {
        return bytes;
    }

    match serde_json::to_vec(&Value::Object(map)) {
        Ok(rewritten) => Bytes::from(rewritten),
        Err(_) => bytes,
    }
}

pub fn sanitize_text(input: &str) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(input, "");
    INLINE_HANDLER.replace_all(&without_scripts, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_blocks_removed() {
        assert_eq!(
            sanitize_text("Hi <script type=\"x\">alert(1)</script>there"),
            "Hi there"
        );
        assert_eq!(
            sanitize_text("a<SCRIPT>\nsteal()\n</SCRIPT>b"),
            "ab"
        );
    }

    #[test]
    fn test_inline_handlers_removed() {
        assert_eq!(
            sanitize_text(r#"<img src="x" onerror="alert(1)">"#),
            r#"<img src="x" >"#
        );
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(sanitize_text("How do I post a job?"), "How do I post a job?");
    }

    #[test]
    fn test_only_top_level_strings_rewritten() {
        let body = Bytes::from(
            r#"{"message":"x<script>bad()</script>","history":[{"role":"user","text":"<script>k</script>"}],"n":1}"#,
        );
        let out: Value = serde_json::from_slice(&sanitize_json_body(body)).unwrap();
        assert_eq!(out["message"], "x");
        assert_eq!(out["history"][0]["text"], "<script>k</script>");
        assert_eq!(out["n"], 1);
    }

    #[test]
    fn test_non_object_body_passes_through() {
        let body = Bytes::from_static(b"[1,2,3]");
        assert_eq!(sanitize_json_body(body.clone()), body);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_fixed_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").await);
        }
        assert!(!limiter.check("10.0.0.1").await);

        // Other clients have their own window
        assert!(limiter.check("10.0.0.2").await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.check("10.0.0.1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_drops_elapsed_windows() {
        let limiter = RateLimiter::new(10, Duration::from_secs(60));
        limiter.check("10.0.0.1").await;
        tokio::time::advance(Duration::from_secs(30)).await;
        limiter.check("10.0.0.2").await;
        tokio::time::advance(Duration::from_secs(45)).await;

        limiter.purge_expired().await;
        assert_eq!(limiter.tracked_clients().await, 1);
    }
}
