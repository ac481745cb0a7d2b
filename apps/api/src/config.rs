use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_MODEL;

const DEFAULT_JWT_SECRET: &str = "secret_key_ivo";
/// Example value shipped in `.env.example`; never a real key.
const EXAMPLE_GEMINI_KEY: &str = "YOUR_GEMINI_API_KEY";
const PLACEHOLDER_PREFIX: &str = "your_";

/// Application configuration loaded from environment variables.
/// Every variable has a default, so a bare `cargo run` serves the site in memory mode.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Usable Gemini key, or `None` when unset or still a placeholder.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_timeout: Duration,
    /// Overrides the Gemini `models` root; `None` uses the public endpoint.
    pub gemini_api_base: Option<String>,
    pub port: u16,
    pub static_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            jwt_secret: optional_env("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            gemini_api_key: remote_credential(optional_env("GEMINI_API_KEY")),
            gemini_model: optional_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_timeout: Duration::from_secs(parse_env("GEMINI_TIMEOUT_SECS", 15)?),
            gemini_api_base: optional_env("GEMINI_API_BASE"),
            port: parse_env("PORT", 4000)?,
            static_dir: optional_env("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            upload_dir: optional_env("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            rate_limit_max_requests: parse_env("RATE_LIMIT_MAX_REQUESTS", 100)?,
            rate_limit_window: Duration::from_secs(parse_env("RATE_LIMIT_WINDOW_SECS", 15 * 60)?),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

/// Filters out credentials that are obviously unconfigured: empty, the documented
/// example value, or anything starting with the `your_` placeholder prefix.
pub fn remote_credential(raw: Option<String>) -> Option<String> {
    let key = raw?.trim().to_string();
    if key.is_empty() || key == EXAMPLE_GEMINI_KEY || key.starts_with(PLACEHOLDER_PREFIX) {
        return None;
    }
    Some(key)
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
