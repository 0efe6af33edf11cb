use std::sync::Arc;

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::commands::{DreamCommand, parse_dream_command};
use crate::config::DreamConfig;
use crate::events::Reply;
use crate::history::{collect_dream_material, format_dialogue, parse_history};
use crate::host::{ConversationStore, DreamOrigin, HtmlRenderer, MessageEvent, ProviderRegistry};
use crate::prompts;
use crate::render::DreamCard;

/// Ways weaving a dream can fail. `Display` is the text shown to the chat.
#[derive(Debug, Error)]
pub enum DreamError {
    #[error("无法找到当前会话。")]
    NoSession,

    #[error("这里似乎一片寂静，连梦的碎片也找不到。")]
    EmptyHistory,

    #[error("梦境的素材太少了，至少需要 {min} 条有效对话才能编织哦。")]
    NotEnoughMaterial { min: usize, found: usize },

    #[error("核心分析服务不可用，请联系管理员。")]
    ProviderUnavailable,

    #[error("梦境在编织的途中消散了，似乎遇到了一些阻碍...")]
    Pipeline(#[from] anyhow::Error),
}

impl DreamError {
    /// Reply carrying this error back to the chat
    pub fn to_reply(&self) -> Reply {
        Reply::plain(format!("{}{}", prompts::ERROR_PREFIX, self))
    }
}

/// Host services the weaver depends on
#[derive(Clone)]
pub struct HostServices {
    pub conversations: Arc<dyn ConversationStore>,
    pub providers: Arc<dyn ProviderRegistry>,
    pub renderer: Arc<dyn HtmlRenderer>,
}

/// Turns a chat's recent history into a rendered dream card
#[derive(Clone)]
pub struct DreamWeaver {
    config: Arc<RwLock<DreamConfig>>,
    host: HostServices,
    today: fn() -> NaiveDate,
}

impl DreamWeaver {
    pub fn new(config: Arc<RwLock<DreamConfig>>, host: HostServices) -> Self {
        Self {
            config,
            host,
            today: || Local::now().date_naive(),
        }
    }

    /// Pin the date stamped on cards
    pub fn with_date_source(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &Arc<RwLock<DreamConfig>> {
        &self.config
    }

    /// Route an incoming chat message. Returns whether it was a dream command.
    pub async fn handle_message<E>(&self, event: &E, text: &str) -> anyhow::Result<bool>
    where
        E: MessageEvent + ?Sized,
    {
        match parse_dream_command(text) {
            Some(DreamCommand::Dream) => {
                self.handle_command(event).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Entry point for the `dream` command
    pub async fn handle_command<E>(&self, event: &E) -> anyhow::Result<()>
    where
        E: MessageEvent + ?Sized,
    {
        if !self.config.read().await.enabled {
            return Ok(());
        }

        event.reply(Reply::plain(prompts::WORKING_NOTICE)).await?;

        let reply = match self.weave(event).await {
            Ok(image_url) => Reply::image(image_url),
            Err(err) => err.to_reply(),
        };
        event.reply(reply).await
    }

    /// Weave a dream for `origin` and return the rendered image URL.
    pub async fn weave<O>(&self, origin: &O) -> Result<String, DreamError>
    where
        O: DreamOrigin + ?Sized,
    {
        let result = self.try_weave(origin).await;
        if let Err(DreamError::Pipeline(err)) = &result {
            error!(
                origin = origin.unified_origin(),
                "Error during dream generation: {:#}", err
            );
        }
        result
    }

    async fn try_weave<O>(&self, origin: &O) -> Result<String, DreamError>
    where
        O: DreamOrigin + ?Sized,
    {
        let config = self.config.read().await.clone();
        let uid = origin.unified_origin();

        let conversation_id = self
            .host
            .conversations
            .current_conversation_id(uid)
            .await?
            .ok_or(DreamError::NoSession)?;

        let conversation = self
            .host
            .conversations
            .conversation(uid, &conversation_id)
            .await?
            .filter(|c| c.has_history())
            .ok_or(DreamError::EmptyHistory)?;

        let entries = parse_history(&conversation.history)?;
        let material = collect_dream_material(&entries, config.max_history_messages);
        if material.len() < config.min_messages_for_dream {
            return Err(DreamError::NotEnoughMaterial {
                min: config.min_messages_for_dream,
                found: material.len(),
            });
        }

        let provider = self
            .host
            .providers
            .current()
            .ok_or(DreamError::ProviderUnavailable)?;

        info!(
            origin = uid,
            messages = material.len(),
            "Weaving dream"
        );

        let prompt = prompts::dream_prompt(&config.dream_style, &format_dialogue(&material));
        let completion = provider
            .text_chat(&prompt, &format!("dream_{}", origin.session_id()))
            .await?;
        let dream_text = completion.text.trim().to_string();

        let group_name = self.group_label(origin).await?;

        let card = DreamCard::new(config.theme(), dream_text, group_name, (self.today)());
        Ok(card.render(self.host.renderer.as_ref()).await?)
    }

    async fn group_label<O>(&self, origin: &O) -> anyhow::Result<String>
    where
        O: DreamOrigin + ?Sized,
    {
        if !origin.is_private_chat() {
            if let Some(name) = origin.group_name().await? {
                if !name.trim().is_empty() {
                    return Ok(name);
                }
            }
        }
        Ok(prompts::FALLBACK_GROUP_LABEL.to_string())
    }
}
