//! Capabilities the host platform lends to the extension.
//!
//! Everything the dream pipeline touches outside its own process (conversation
//! storage, model providers, the HTML renderer, message transport) sits behind
//! one of these traits so the pipeline can be driven by fakes.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::events::{ActiveSession, Conversation, Reply};

/// Conversation lookup keyed by the host's unified session origin
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn current_conversation_id(&self, origin: &str) -> Result<Option<String>>;

    async fn conversation(&self, origin: &str, conversation_id: &str)
    -> Result<Option<Conversation>>;
}

/// Completion returned by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
}

/// A language-model provider reachable through the host
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn text_chat(&self, prompt: &str, session_id: &str) -> Result<Completion>;
}

/// Hands out the provider currently selected on the host, if any
pub trait ProviderRegistry: Send + Sync {
    fn current(&self) -> Option<Arc<dyn CompletionProvider>>;
}

/// HTML-to-image rendering. Returns the URL (or path) of the produced image.
#[async_trait]
pub trait HtmlRenderer: Send + Sync {
    async fn render(&self, template: &str, data: &Value) -> Result<String>;
}

/// Where a dream is woven for
#[async_trait]
pub trait DreamOrigin: Send + Sync {
    /// Host-wide identifier of the chat session
    fn unified_origin(&self) -> &str;

    /// Session id used to scope the provider call
    fn session_id(&self) -> &str;

    fn is_private_chat(&self) -> bool;

    /// Group metadata lookup; only consulted for group chats
    async fn group_name(&self) -> Result<Option<String>>;
}

/// An incoming triggering message that can be answered
#[async_trait]
pub trait MessageEvent: DreamOrigin {
    async fn reply(&self, reply: Reply) -> Result<()>;
}

/// Enumerates active sessions and delivers unsolicited messages to them
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    async fn active_sessions(&self) -> Result<Vec<ActiveSession>>;

    async fn send(&self, origin: &str, reply: Reply) -> Result<()>;
}

#[async_trait]
impl DreamOrigin for ActiveSession {
    fn unified_origin(&self) -> &str {
        &self.unified_origin
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn is_private_chat(&self) -> bool {
        self.is_private
    }

    async fn group_name(&self) -> Result<Option<String>> {
        Ok(self.group_name.clone())
    }
}

/// Registry backed by a fixed provider, or none at all
#[derive(Clone, Default)]
pub struct StaticProviders {
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl StaticProviders {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

impl ProviderRegistry for StaticProviders {
    fn current(&self) -> Option<Arc<dyn CompletionProvider>> {
        self.provider.clone()
    }
}
