//! Stand-in host used by the `dreamweaver` binary.
//!
//! Conversations come from a JSON file, cards are rendered to HTML files with
//! handlebars, and replies go to stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use handlebars::Handlebars;
use serde_json::Value;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::events::{ActiveSession, Conversation, Reply};
use crate::host::{ConversationStore, DreamOrigin, HtmlRenderer, MessageEvent, SessionDirectory};

/// A single conversation stored as a JSON file.
///
/// The file holds either the history array itself or an object with a
/// `history` array.
pub struct FileConversationStore {
    origin: String,
    path: PathBuf,
}

impl FileConversationStore {
    pub fn new(origin: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            origin: origin.into(),
            path: path.into(),
        }
    }

    fn conversation_id(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("conversation")
            .to_string()
    }
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn current_conversation_id(&self, origin: &str) -> Result<Option<String>> {
        if origin != self.origin || !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(None);
        }
        Ok(Some(self.conversation_id()))
    }

    async fn conversation(
        &self,
        origin: &str,
        conversation_id: &str,
    ) -> Result<Option<Conversation>> {
        if origin != self.origin || conversation_id != self.conversation_id() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        let history = match value {
            Value::Object(mut object) => object.remove("history").unwrap_or(Value::Null),
            other => other,
        };
        let history = match history {
            Value::Null => String::new(),
            Value::String(raw) => raw,
            other => other.to_string(),
        };

        Ok(Some(Conversation::new(conversation_id, history)))
    }
}

/// Renders cards to standalone HTML files
pub struct FileRenderer {
    out_dir: PathBuf,
    registry: Handlebars<'static>,
}

impl FileRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        Self {
            out_dir: out_dir.into(),
            registry,
        }
    }
}

#[async_trait]
impl HtmlRenderer for FileRenderer {
    async fn render(&self, template: &str, data: &Value) -> Result<String> {
        let html = self
            .registry
            .render_template(template, data)
            .context("Failed to fill card template")?;

        fs::create_dir_all(&self.out_dir)
            .await
            .context("Failed to create output directory")?;

        let file_name = format!(
            "dream-{}-{}.html",
            Local::now().format("%Y%m%d-%H%M%S"),
            Uuid::new_v4().simple()
        );
        let path = self.out_dir.join(file_name);
        fs::write(&path, html)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("Dream card written to {}", path.display());
        Ok(path.display().to_string())
    }
}

/// A command typed on the terminal, answered on stdout
#[derive(Debug, Clone)]
pub struct ConsoleEvent {
    pub origin: String,
    pub session_id: String,
    pub is_private: bool,
    pub group_name: Option<String>,
}

impl ConsoleEvent {
    pub fn new(origin: impl Into<String>, group_name: Option<String>, is_private: bool) -> Self {
        Self {
            origin: origin.into(),
            session_id: Uuid::new_v4().to_string(),
            is_private,
            group_name,
        }
    }

    pub fn as_session(&self) -> ActiveSession {
        ActiveSession {
            unified_origin: self.origin.clone(),
            session_id: self.session_id.clone(),
            is_private: self.is_private,
            group_name: self.group_name.clone(),
        }
    }
}

fn print_reply(reply: &Reply) {
    match reply {
        Reply::Plain(text) => println!("{}", text),
        Reply::Image(url) => println!("🖼️  {}", url),
    }
}

#[async_trait]
impl DreamOrigin for ConsoleEvent {
    fn unified_origin(&self) -> &str {
        &self.origin
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

#[async_trait]
impl MessageEvent for ConsoleEvent {
    async fn reply(&self, reply: Reply) -> Result<()> {
        print_reply(&reply);
        Ok(())
    }
}

/// Session directory that knows exactly one session and prints to stdout
pub struct ConsoleDirectory {
    session: ActiveSession,
}

impl ConsoleDirectory {
    pub fn new(session: ActiveSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl SessionDirectory for ConsoleDirectory {
    async fn active_sessions(&self) -> Result<Vec<ActiveSession>> {
        Ok(vec![self.session.clone()])
    }

    async fn send(&self, origin: &str, reply: Reply) -> Result<()> {
        println!("[{}]", origin);
        print_reply(&reply);
        Ok(())
    }
}
