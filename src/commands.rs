use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Chat commands the extension answers to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum DreamCommand {
    /// Weave the recent conversation into a dream card
    Dream,
}

impl DreamCommand {
    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }

    /// Localized aliases accepted in place of the command string.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            DreamCommand::Dream => &["入梦", "织梦"],
        }
    }
}

/// Command triggered by a chat message, if any. Trailing words are ignored.
pub fn parse_dream_command(input: &str) -> Option<DreamCommand> {
    let body = input.trim_start().strip_prefix('/')?;
    let head = body.split_whitespace().next()?;

    DreamCommand::from_str(&head.to_lowercase())
        .ok()
        .or_else(|| DreamCommand::iter().find(|command| command.aliases().contains(&head)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recognises_command_and_aliases() {
        for text in ["/dream", "/DREAM", "  /入梦", "/织梦 please", "/dream tonight please"] {
            assert_eq!(
                parse_dream_command(text),
                Some(DreamCommand::Dream),
                "{text:?} should trigger"
            );
        }
    }

    #[test]
    fn ignores_plain_text_and_unknown_commands() {
        assert_eq!(parse_dream_command("dream"), None);
        assert_eq!(parse_dream_command("/"), None);
        assert_eq!(parse_dream_command("/sleep"), None);
        assert_eq!(parse_dream_command("/dreamer"), None);
    }

    #[test]
    fn command_string_is_kebab_case() {
        assert_eq!(DreamCommand::Dream.command(), "dream");
    }
}
