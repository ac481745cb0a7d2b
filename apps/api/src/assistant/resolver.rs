//! Response Resolver: local knowledge base, then remote generator, then static hint.
//!
//! Exactly one path produces the answer and `source` always names that path.
//! Remote failures are logged and replaced by the static hint; the only error a
//! caller can see is an empty message. Whitespace counts as content.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::assistant::knowledge_base::{KnowledgeEntry, KNOWLEDGE_BASE};
use crate::assistant::matcher::find_best_match;
use crate::assistant::prompts::FALLBACK_RESPONSE;
use crate::assistant::remote::RemoteGenerator;
use crate::errors::AppError;
use crate::models::chat::ChatTurn;

/// Which resolution path produced a chat response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseSource {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "gemini")]
    Remote,
    #[serde(rename = "fallback")]
    Fallback,
}

#[derive(Debug, Clone)]
pub struct ChatQuery {
    pub message: String,
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatResult {
    pub response: String,
    pub source: ResponseSource,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("Message is required.")]
    InvalidRequest,
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// The assistant shared by all chat requests. Immutable after startup.
pub struct Assistant {
    knowledge: &'static [KnowledgeEntry],
    remote: Option<Arc<dyn RemoteGenerator>>,
}

impl Assistant {
    pub fn new(remote: Option<Arc<dyn RemoteGenerator>>) -> Self {
        Self::with_knowledge(KNOWLEDGE_BASE, remote)
    }

    pub fn with_knowledge(
        knowledge: &'static [KnowledgeEntry],
        remote: Option<Arc<dyn RemoteGenerator>>,
    ) -> Self {
        Self { knowledge, remote }
    }

    pub fn remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn resolve(&self, query: &ChatQuery) -> Result<ChatResult, ChatError> {
        if query.message.is_empty() {
            return Err(ChatError::InvalidRequest);
        }

        if let Some(response) = find_best_match(&query.message, self.knowledge) {
            debug!("Chat answered from knowledge base");
            return Ok(ChatResult {
                response: response.to_string(),
                source: ResponseSource::Local,
            });
        }

        if let Some(remote) = &self.remote {
            match remote.generate(&query.message, &query.history).await {
                Ok(text) => {
                    debug!("Chat answered by remote generator {}", remote.name());
                    return Ok(ChatResult {
                        response: text,
                        source: ResponseSource::Remote,
                    });
                }
                Err(e) => error!("Remote assistant error ({}): {e}", remote.name()),
            }
        }

        Ok(ChatResult {
            response: FALLBACK_RESPONSE.to_string(),
            source: ResponseSource::Fallback,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assistant::remote::RemoteUnavailable;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records the message and history it is handed and replies with a fixed outcome.
    pub(crate) struct RecordingRemote {
        reply: Result<String, String>,
        pub calls: Mutex<Vec<(String, Vec<ChatTurn>)>>,
    }

    impl RecordingRemote {
        pub(crate) fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(reason.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RemoteGenerator for RecordingRemote {
        fn name(&self) -> &str {
            "recording"
        }

        async fn generate(
            &self,
            message: &str,
            history: &[ChatTurn],
        ) -> Result<String, RemoteUnavailable> {
            self.calls
                .lock()
                .unwrap()
                .push((message.to_string(), history.to_vec()));
            self.reply.clone().map_err(RemoteUnavailable)
        }
    }

    fn query(message: &str) -> ChatQuery {
        ChatQuery {
            message: message.to_string(),
            history: vec![],
        }
    }

    #[tokio::test]
    async fn test_post_job_resolves_locally() {
        let assistant = Assistant::new(None);
        let result = assistant.resolve(&query("How do I post a job?")).await.unwrap();
        assert_eq!(result.source, ResponseSource::Local);
        assert_eq!(result.response, KNOWLEDGE_BASE[1].response);
    }

    #[tokio::test]
    async fn test_local_match_skips_remote() {
        let remote = RecordingRemote::ok("remote text");
        let assistant = Assistant::new(Some(remote.clone()));
        let result = assistant.resolve(&query("hello there")).await.unwrap();
        assert_eq!(result.source, ResponseSource::Local);
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_message_rejected_before_any_lookup() {
        let remote = RecordingRemote::ok("remote text");
        let assistant = Assistant::new(Some(remote.clone()));
        assert_eq!(
            assistant.resolve(&query("")).await,
            Err(ChatError::InvalidRequest)
        );
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_message_is_answered() {
        let assistant = Assistant::new(None);
        let result = assistant.resolve(&query("   ")).await.unwrap();
        assert_eq!(result.source, ResponseSource::Fallback);
        assert_eq!(result.response, FALLBACK_RESPONSE);

        let remote = RecordingRemote::ok("How can I help?");
        let assistant = Assistant::new(Some(remote.clone()));
        let result = assistant.resolve(&query("   ")).await.unwrap();
        assert_eq!(result.source, ResponseSource::Remote);
        assert_eq!(remote.call_count(), 1);
    }

    #[tokio::test]
    async fn test_gibberish_without_remote_falls_back() {
        let assistant = Assistant::new(None);
        let result = assistant
            .resolve(&query("asdkjasd random gibberish"))
            .await
            .unwrap();
        assert_eq!(result.source, ResponseSource::Fallback);
        assert_eq!(result.response, FALLBACK_RESPONSE);
    }

    #[tokio::test]
    async fn test_failing_remote_falls_back() {
        let remote = RecordingRemote::failing("API key not valid");
        let assistant = Assistant::new(Some(remote.clone()));
        let result = assistant
            .resolve(&query("asdkjasd random gibberish"))
            .await
            .unwrap();
        assert_eq!(result.source, ResponseSource::Fallback);
        assert_eq!(result.response, FALLBACK_RESPONSE);
        assert_eq!(remote.call_count(), 1);
    }

    #[tokio::test]
    async fn test_working_remote_receives_message_and_history() {
        let remote = RecordingRemote::ok("Salaries are listed on each job card.");
        let assistant = Assistant::new(Some(remote.clone()));
        let history = vec![
            ChatTurn::user("what's up"),
            ChatTurn::model("Not much."),
        ];
        let result = assistant
            .resolve(&ChatQuery {
                message: "what salary ranges exist".to_string(),
                history: history.clone(),
            })
            .await
            .unwrap();

        assert_eq!(result.source, ResponseSource::Remote);
        assert_eq!(result.response, "Salaries are listed on each job card.");

        let calls = remote.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (message, forwarded) = &calls[0];
        assert_eq!(message, "what salary ranges exist");
        assert_eq!(forwarded, &history);
    }

    #[test]
    fn test_source_wire_names() {
        assert_eq!(
            serde_json::to_value(ResponseSource::Local).unwrap(),
            "local"
        );
        assert_eq!(
            serde_json::to_value(ResponseSource::Remote).unwrap(),
            "gemini"
        );
        assert_eq!(
            serde_json::to_value(ResponseSource::Fallback).unwrap(),
            "fallback"
        );
    }
}
