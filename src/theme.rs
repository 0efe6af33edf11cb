use std::collections::HashMap;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString, IntoStaticStr};
use tracing::warn;

/// Visual variants of the dream card
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DreamTheme {
    #[default]
    MidnightGothic,
    StarlightNebula,
    AncientScroll,
}

/// CSS variables a theme plugs into the card template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub bg_color: &'static str,
    pub card_bg: &'static str,
    pub font_color: &'static str,
    pub title_color: &'static str,
    pub border_color: &'static str,
    pub shadow_color: &'static str,
    pub font_main: &'static str,
    pub font_title: &'static str,
}

pub static THEME_PALETTES: Lazy<HashMap<DreamTheme, Palette>> = Lazy::new(|| {
    use DreamTheme::*;

    let mut map = HashMap::new();

    map.insert(
        MidnightGothic,
        Palette {
            bg_color: "#1a1b26",
            card_bg: "radial-gradient(ellipse at bottom, #1b2735 0%, #090a0f 100%)",
            font_color: "#a9b1d6",
            title_color: "#bb9af7",
            border_color: "#3b4261",
            shadow_color: "rgba(187, 154, 247, 0.3)",
            font_main: "Noto Serif SC, serif",
            font_title: "Orbitron, sans-serif",
        },
    );

    map.insert(
        StarlightNebula,
        Palette {
            bg_color: "#000000",
            card_bg: "#0d0d2b",
            font_color: "#e0e0e0",
            title_color: "#7dcfff",
            border_color: "#4a4a70",
            shadow_color: "rgba(125, 207, 255, 0.4)",
            font_main: "Noto Serif SC, serif",
            font_title: "Orbitron, sans-serif",
        },
    );

    map.insert(
        AncientScroll,
        Palette {
            bg_color: "#f5e8d7",
            card_bg: "#fdf6e3",
            font_color: "#654321",
            title_color: "#8b4513",
            border_color: "#d2b48c",
            shadow_color: "rgba(139, 69, 19, 0.2)",
            font_main: "Noto Serif SC, serif",
            font_title: "Noto Serif SC, serif",
        },
    );

    map
});

impl DreamTheme {
    /// Resolve a configured theme id, falling back to the default on unknown ids.
    pub fn resolve(id: &str) -> Self {
        DreamTheme::from_str(id.trim()).unwrap_or_else(|_| {
            warn!("Unknown dream theme '{}', using {}", id, DreamTheme::default().id());
            DreamTheme::default()
        })
    }

    pub fn id(self) -> &'static str {
        self.into()
    }

    pub fn palette(self) -> &'static Palette {
        &THEME_PALETTES[&self]
    }
}
