#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::RwLock;

use dreamweaver::events::{ActiveSession, Conversation, Reply};
use dreamweaver::host::{
    Completion, CompletionProvider, ConversationStore, DreamOrigin, HtmlRenderer, MessageEvent,
    SessionDirectory, StaticProviders,
};
use dreamweaver::{DreamConfig, DreamWeaver, HostServices};

pub const IMAGE_URL: &str = "https://render.local/dream.png";

/// History with `n` user messages `m1..=mn`, each followed by an assistant reply
pub fn user_history(n: usize) -> String {
    let mut entries = Vec::new();
    for i in 1..=n {
        entries.push(json!({"role": "user", "content": format!("m{}", i)}));
        entries.push(json!({"role": "assistant", "content": format!("reply {}", i)}));
    }
    Value::Array(entries).to_string()
}

#[derive(Default)]
pub struct FakeStore {
    pub conversation_id: Option<String>,
    pub history: Option<String>,
    pub lookups: AtomicUsize,
}

impl FakeStore {
    pub fn with_history(history: impl Into<String>) -> Self {
        Self {
            conversation_id: Some("conv-1".to_string()),
            history: Some(history.into()),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversationStore for FakeStore {
    async fn current_conversation_id(&self, _origin: &str) -> Result<Option<String>> {
        Ok(self.conversation_id.clone())
    }

    async fn conversation(
        &self,
        _origin: &str,
        conversation_id: &str,
    ) -> Result<Option<Conversation>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .history
            .clone()
            .map(|history| Conversation::new(conversation_id, history)))
    }
}

pub struct FakeProvider {
    pub answer: Result<String, String>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl FakeProvider {
    pub fn answering(text: &str) -> Self {
        Self {
            answer: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            answer: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn text_chat(&self, prompt: &str, session_id: &str) -> Result<Completion> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), session_id.to_string()));
        match &self.answer {
            Ok(text) => Ok(Completion { text: text.clone() }),
            Err(message) => Err(anyhow!("{}", message)),
        }
    }
}

#[derive(Default)]
pub struct FakeRenderer {
    pub renders: Mutex<Vec<(String, Value)>>,
}

impl FakeRenderer {
    pub fn last_data(&self) -> Value {
        self.renders
            .lock()
            .unwrap()
            .last()
            .map(|(_, data)| data.clone())
            .expect("nothing rendered")
    }
}

#[async_trait]
impl HtmlRenderer for FakeRenderer {
    async fn render(&self, template: &str, data: &Value) -> Result<String> {
        self.renders
            .lock()
            .unwrap()
            .push((template.to_string(), data.clone()));
        Ok(IMAGE_URL.to_string())
    }
}

pub struct FakeEvent {
    pub private: bool,
    pub group: Result<Option<String>, String>,
    pub replies: Mutex<Vec<Reply>>,
}

impl FakeEvent {
    pub fn group(name: &str) -> Self {
        Self {
            private: false,
            group: Ok(Some(name.to_string())),
            replies: Mutex::new(Vec::new()),
        }
    }

    pub fn private() -> Self {
        Self {
            private: true,
            group: Ok(Some("should not be used".to_string())),
            replies: Mutex::new(Vec::new()),
        }
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl DreamOrigin for FakeEvent {
    fn unified_origin(&self) -> &str {
        "qq:GroupMessage:42"
    }

    fn session_id(&self) -> &str {
        "42"
    }

    fn is_private_chat(&self) -> bool {
        self.private
    }

    async fn group_name(&self) -> Result<Option<String>> {
        self.group.clone().map_err(|message| anyhow!("{}", message))
    }
}

#[async_trait]
impl MessageEvent for FakeEvent {
    async fn reply(&self, reply: Reply) -> Result<()> {
        self.replies.lock().unwrap().push(reply);
        Ok(())
    }
}

/// Directory with fixed sessions; delivered replies are forwarded to a channel
pub struct FakeDirectory {
    pub sessions: Vec<ActiveSession>,
    pub delivered: tokio::sync::mpsc::UnboundedSender<(String, Reply)>,
}

#[async_trait]
impl SessionDirectory for FakeDirectory {
    async fn active_sessions(&self) -> Result<Vec<ActiveSession>> {
        Ok(self.sessions.clone())
    }

    async fn send(&self, origin: &str, reply: Reply) -> Result<()> {
        let _ = self.delivered.send((origin.to_string(), reply));
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<FakeStore>,
    pub provider: Option<Arc<FakeProvider>>,
    pub renderer: Arc<FakeRenderer>,
    pub weaver: DreamWeaver,
}

pub fn harness(
    config: DreamConfig,
    store: FakeStore,
    provider: Option<FakeProvider>,
) -> Harness {
    let store = Arc::new(store);
    let provider = provider.map(Arc::new);
    let renderer = Arc::new(FakeRenderer::default());

    let providers = match &provider {
        Some(provider) => StaticProviders::new(provider.clone()),
        None => StaticProviders::none(),
    };

    let host = HostServices {
        conversations: store.clone(),
        providers: Arc::new(providers),
        renderer: renderer.clone(),
    };

    let weaver = DreamWeaver::new(Arc::new(RwLock::new(config)), host)
        .with_date_source(|| chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

    Harness {
        store,
        provider,
        renderer,
        weaver,
    }
}

pub fn config_with(min: usize, max: usize) -> DreamConfig {
    DreamConfig {
        min_messages_for_dream: min,
        max_history_messages: max,
        ..DreamConfig::default()
    }
}
