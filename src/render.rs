use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::host::HtmlRenderer;
use crate::theme::{DreamTheme, Palette};

/// Static card layout. Placeholders are plain `{{ name }}` substitutions.
pub const DREAM_TEMPLATE: &str = include_str!("../assets/dream_card.html");

/// Everything the card template needs
#[derive(Debug, Clone, Serialize)]
pub struct DreamCard {
    pub theme: DreamTheme,
    pub dream_text: String,
    pub group_name: String,
    pub dream_date: String,
    #[serde(flatten)]
    pub palette: Palette,
}

impl DreamCard {
    pub fn new(
        theme: DreamTheme,
        dream_text: impl Into<String>,
        group_name: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            theme,
            dream_text: dream_text.into(),
            group_name: group_name.into(),
            dream_date: date.format("%Y-%m-%d").to_string(),
            palette: theme.palette().clone(),
        }
    }

    pub fn to_data(&self) -> Result<Value> {
        serde_json::to_value(self).context("Failed to serialize dream card")
    }

    /// Hand the card to the renderer and return where the image ended up.
    pub async fn render(&self, renderer: &dyn HtmlRenderer) -> Result<String> {
        let data = self.to_data()?;
        renderer
            .render(DREAM_TEMPLATE, &data)
            .await
            .context("Failed to render dream card")
    }
}
