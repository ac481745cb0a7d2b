// Fixed text for the assistant. The priming pair is prepended to every Gemini conversation.

pub const PRIMING_INSTRUCTION: &str = "You are the IVO Assistant. Be concise and helpful.";

pub const PRIMING_ACKNOWLEDGEMENT: &str = "Understood.";

/// Returned when neither the knowledge base nor Gemini produced an answer.
pub const FALLBACK_RESPONSE: &str = "I'm not sure about that. I can help you find talent, post jobs, or navigate the site. Try asking 'How do I post a job?' or 'Where can I find workers?'";
