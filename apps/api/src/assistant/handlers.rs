use axum::{extract::State, Json};
use serde::Deserialize;

use crate::assistant::resolver::{ChatQuery, ChatResult};
use crate::errors::{AppError, AppJson};
use crate::models::chat::{deserialize_history, ChatTurn};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// Unreadable history is ignored rather than failing the request.
    #[serde(default, deserialize_with = "deserialize_history")]
    pub history: Vec<ChatTurn>,
}

/// POST /api/ai/chat
///
/// Always answers a non-empty message; `source` tells which path produced the text.
pub async fn handle_chat(
    State(state): State<AppState>,
    AppJson(request): AppJson<ChatRequest>,
) -> Result<Json<ChatResult>, AppError> {
    let query = ChatQuery {
        message: request.message.unwrap_or_default(),
        history: request.history,
    };
    let result = state.assistant.resolve(&query).await?;
    Ok(Json(result))
}
