use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Speaker of a single conversation turn, spelled the way the generative service expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

/// One turn of assistant conversation history.
///
/// Accepts either `{ role, text }` or the generative service's native
/// `{ role, parts: [{ text }] }` on the wire; both collapse into `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireTurn")]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Reads conversation history without failing the request.
///
/// Anything other than an array counts as no history, and turns that do not
/// parse (unknown role, missing text) are dropped.
pub fn deserialize_history<'de, D>(deserializer: D) -> Result<Vec<ChatTurn>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        Some(other) => {
            debug!("Ignoring non-array chat history: {other}");
            return Ok(Vec::new());
        }
        None => return Ok(Vec::new()),
    };

    let total = items.len();
    let turns: Vec<ChatTurn> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if turns.len() < total {
        debug!("Dropped {} unreadable history turns", total - turns.len());
    }
    Ok(turns)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireTurn {
    Plain { role: ChatRole, text: String },
    Parts { role: ChatRole, parts: Vec<WirePart> },
}

#[derive(Deserialize)]
struct WirePart {
    #[serde(default)]
    text: String,
}

impl From<WireTurn> for ChatTurn {
    fn from(turn: WireTurn) -> Self {
        match turn {
            WireTurn::Plain { role, text } => ChatTurn { role, text },
            WireTurn::Parts { role, parts } => ChatTurn {
                role,
                text: parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join(""),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_turn_deserializes() {
        let turn: ChatTurn = serde_json::from_str(r#"{"role":"model","text":"Sure."}"#).unwrap();
        assert_eq!(turn, ChatTurn::model("Sure."));
    }

    #[test]
    fn test_parts_turn_concatenates_text() {
        let turn: ChatTurn = serde_json::from_str(
            r#"{"role":"user","parts":[{"text":"Where are "},{"text":"the jobs?"}]}"#,
        )
        .unwrap();
        assert_eq!(turn, ChatTurn::user("Where are the jobs?"));
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result = serde_json::from_str::<ChatTurn>(r#"{"role":"system","text":"x"}"#);
        assert!(result.is_err());
    }

    #[derive(Deserialize)]
    struct WithHistory {
        #[serde(default, deserialize_with = "deserialize_history")]
        history: Vec<ChatTurn>,
    }

    #[test]
    fn test_history_drops_unreadable_turns() {
        let parsed: WithHistory = serde_json::from_str(
            r#"{"history":[
                {"role":"function","parts":[{"text":"x"}]},
                {"role":"user","text":"kept"},
                {"role":"model"},
                "not a turn"
            ]}"#,
        )
        .unwrap();
        assert_eq!(parsed.history, vec![ChatTurn::user("kept")]);
    }

    #[test]
    fn test_history_non_array_or_null_is_empty() {
        for body in [r#"{"history":"oops"}"#, r#"{"history":null}"#, r#"{}"#, r#"{"history":{"role":"user"}}"#] {
            let parsed: WithHistory = serde_json::from_str(body).unwrap();
            assert!(parsed.history.is_empty(), "{body}");
        }
    }
}
