// Assistant chat widget backend.
// Resolution order: local knowledge base, then Gemini (when configured), then a static hint.
// All Gemini calls go through llm_client.

pub mod handlers;
pub mod knowledge_base;
pub mod matcher;
pub mod prompts;
pub mod remote;
pub mod resolver;
