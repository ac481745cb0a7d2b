//! Remote Fallback Adapter: forwards unmatched questions to Gemini.
//!
//! The resolver holds an `Option<Arc<dyn RemoteGenerator>>`; `None` means no usable
//! credential was configured at startup and the remote step is skipped entirely.

use async_trait::async_trait;
use thiserror::Error;

use crate::assistant::prompts::{PRIMING_ACKNOWLEDGEMENT, PRIMING_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::models::chat::ChatTurn;

/// Any failure of the generative service. Absorbed by the resolver, never sent to clients.
#[derive(Debug, Error)]
#[error("remote assistant unavailable: {0}")]
pub struct RemoteUnavailable(pub String);

#[async_trait]
pub trait RemoteGenerator: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    async fn generate(
        &self,
        message: &str,
        history: &[ChatTurn],
    ) -> Result<String, RemoteUnavailable>;
}

/// Priming pair, then caller history in order, then the new user message.
pub fn build_transcript(history: &[ChatTurn], message: &str) -> Vec<ChatTurn> {
    let mut turns = Vec::with_capacity(history.len() + 3);
    turns.push(ChatTurn::user(PRIMING_INSTRUCTION));
    turns.push(ChatTurn::model(PRIMING_ACKNOWLEDGEMENT));
    turns.extend_from_slice(history);
    turns.push(ChatTurn::user(message));
    turns
}

/// Gemini-backed generator.
pub struct GeminiGenerator {
    llm: LlmClient,
}

impl GeminiGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl RemoteGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        self.llm.model()
    }

    async fn generate(
        &self,
        message: &str,
        history: &[ChatTurn],
    ) -> Result<String, RemoteUnavailable> {
        let transcript = build_transcript(history, message);
        self.llm
            .generate(&transcript)
            .await
            .map_err(|e| RemoteUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::prompts::FALLBACK_RESPONSE;
    use crate::assistant::resolver::{Assistant, ChatQuery, ResponseSource};
    use crate::models::chat::ChatRole;
    use axum::{
        body::Bytes,
        http::{HeaderMap, StatusCode, Uri},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// What the local stand-in for Gemini does with each request.
    #[derive(Clone, Copy)]
    enum StubReply {
        Status(u16, &'static str),
        Stall(Duration),
    }

    /// A request as seen by the stand-in server.
    #[derive(Debug, Clone)]
    struct SeenRequest {
        path: String,
        api_key: Option<String>,
        body: Value,
    }

    /// Serves `reply` on an ephemeral port and returns its base URL plus the request log.
    async fn spawn_gemini_stub(reply: StubReply) -> (String, Arc<Mutex<Vec<SeenRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let app = Router::new().fallback(move |uri: Uri, headers: HeaderMap, body: Bytes| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(SeenRequest {
                    path: uri.path().to_string(),
                    api_key: headers
                        .get("x-goog-api-key")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                    body: serde_json::from_slice(&body).unwrap_or(Value::Null),
                });
                match reply {
                    StubReply::Status(code, text) => {
                        (StatusCode::from_u16(code).unwrap(), text.to_string())
                    }
                    StubReply::Stall(delay) => {
                        tokio::time::sleep(delay).await;
                        (StatusCode::OK, OK_BODY.to_string())
                    }
                }
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    const OK_BODY: &str = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Pay ranges are on each listing."}]},"finishReason":"STOP"}]}"#;

    fn assistant_against(base_url: &str, timeout: Duration) -> Assistant {
        let llm = LlmClient::new("test-key".to_string(), "gemini-pro".to_string(), timeout)
            .unwrap()
            .with_base_url(base_url);
        Assistant::new(Some(Arc::new(GeminiGenerator::new(llm))))
    }

    fn unmatched(history: Vec<ChatTurn>) -> ChatQuery {
        ChatQuery {
            message: "what salary ranges exist".to_string(),
            history,
        }
    }

    #[tokio::test]
    async fn test_gemini_answer_and_wire_contents() {
        let (base, seen) = spawn_gemini_stub(StubReply::Status(200, OK_BODY)).await;
        let assistant = assistant_against(&base, Duration::from_secs(5));
        let history = vec![ChatTurn::user("earlier question"), ChatTurn::model("earlier answer")];

        let result = assistant.resolve(&unmatched(history)).await.unwrap();
        assert_eq!(result.source, ResponseSource::Remote);
        assert_eq!(result.response, "Pay ranges are on each listing.");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].path, "/gemini-pro:generateContent");
        assert_eq!(seen[0].api_key.as_deref(), Some("test-key"));
        assert_eq!(
            seen[0].body,
            json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": PRIMING_INSTRUCTION }] },
                    { "role": "model", "parts": [{ "text": PRIMING_ACKNOWLEDGEMENT }] },
                    { "role": "user", "parts": [{ "text": "earlier question" }] },
                    { "role": "model", "parts": [{ "text": "earlier answer" }] },
                    { "role": "user", "parts": [{ "text": "what salary ranges exist" }] }
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_gemini_failures_fall_back() {
        let patient = Duration::from_secs(5);
        let failures = [
            (
                StubReply::Status(403, r#"{"error":{"code":403,"message":"API key not valid."}}"#),
                patient,
            ),
            (StubReply::Status(200, "{not json"), patient),
            (
                StubReply::Status(200, r#"{"candidates":[{"finishReason":"SAFETY"}]}"#),
                patient,
            ),
            (
                StubReply::Stall(Duration::from_millis(500)),
                Duration::from_millis(100),
            ),
        ];
        for (reply, timeout) in failures {
            let (base, seen) = spawn_gemini_stub(reply).await;
            let assistant = assistant_against(&base, timeout);

            let result = assistant.resolve(&unmatched(vec![])).await.unwrap();
            assert_eq!(result.source, ResponseSource::Fallback);
            assert_eq!(result.response, FALLBACK_RESPONSE);
            assert_eq!(seen.lock().unwrap().len(), 1, "no retry expected");
        }
    }

    #[tokio::test]
    async fn test_generator_reports_status_in_error() {
        let (base, _seen) =
            spawn_gemini_stub(StubReply::Status(429, r#"{"error":{"message":"quota"}}"#)).await;
        let llm = LlmClient::new("k".to_string(), "gemini-pro".to_string(), Duration::from_secs(5))
            .unwrap()
            .with_base_url(format!("{base}/"));
        let err = GeminiGenerator::new(llm)
            .generate("hi", &[])
            .await
            .unwrap_err();
        assert!(err.0.contains("429"), "{}", err.0);
        assert!(err.0.contains("quota"), "{}", err.0);
    }

    #[test]
    fn test_transcript_without_history() {
        let turns = build_transcript(&[], "What is the salary range?");
        assert_eq!(
            turns,
            vec![
                ChatTurn::user(PRIMING_INSTRUCTION),
                ChatTurn::model(PRIMING_ACKNOWLEDGEMENT),
                ChatTurn::user("What is the salary range?"),
            ]
        );
    }

    #[test]
    fn test_transcript_keeps_history_order() {
        let history = vec![
            ChatTurn::user("first question"),
            ChatTurn::model("first answer"),
            ChatTurn::user("second question"),
        ];
        let turns = build_transcript(&history, "third question");
        assert_eq!(turns.len(), 6);
        assert_eq!(&turns[2..5], history.as_slice());
        assert_eq!(turns[5].role, ChatRole::User);
        assert_eq!(turns[5].text, "third question");
    }
}
