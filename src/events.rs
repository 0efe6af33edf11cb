use serde::{Deserialize, Serialize};

/// Outbound payloads the host can deliver back into a chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// Plain text message
    Plain(String),
    /// Rendered image, as the URL or path the renderer handed back
    Image(String),
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Reply::Plain(text.into())
    }

    pub fn image(url: impl Into<String>) -> Self {
        Reply::Image(url.into())
    }
}

/// A host-managed conversation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    /// Serialized JSON array of message entries, exactly as the host stores it
    #[serde(default)]
    pub history: String,
}

impl Conversation {
    pub fn new(id: impl Into<String>, history: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history: history.into(),
        }
    }

    pub fn has_history(&self) -> bool {
        !self.history.trim().is_empty()
    }
}

/// Role tag on a history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Assistant,
    System,
    Tool,
    #[serde(other)]
    Other,
}

impl ConversationRole {
    pub fn is_user(&self) -> bool {
        matches!(self, ConversationRole::User)
    }
}

/// A proactive target found by enumerating the host's sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub unified_origin: String,
    pub session_id: String,
    pub is_private: bool,
    pub group_name: Option<String>,
}
