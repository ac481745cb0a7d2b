//! Avatar storage on local disk. Files are served back under `/uploads`.

use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::errors::AppError;

/// Public URL prefix the upload directory is mounted at.
pub const UPLOAD_URL_PREFIX: &str = "/uploads";

/// Writes the avatar as `<unix-millis>-<sanitised name>` and returns its public path.
pub async fn save_avatar(
    upload_dir: &Path,
    original_name: &str,
    bytes: &[u8],
) -> Result<String, AppError> {
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Upload(format!("create {}: {e}", upload_dir.display())))?;

    let file_name = format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        sanitize_file_name(original_name)
    );
    let path = upload_dir.join(&file_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Upload(format!("write {}: {e}", path.display())))?;

    info!("Stored avatar {} ({} bytes)", file_name, bytes.len());
    Ok(format!("{UPLOAD_URL_PREFIX}/{file_name}"))
}

/// Keeps only the final path component and replaces anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "avatar".to_string()
    } else {
        cleaned.to_string()
    }
}
