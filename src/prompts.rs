/// Shown while the dream is being woven.
pub const WORKING_NOTICE: &str = "嘘...我正在潜入大家的意识深处，寻找梦的素材...";

/// Label used when the chat is private or the host has no group name.
pub const FALLBACK_GROUP_LABEL: &str = "一个神秘的梦境空间";

/// Prefix put in front of every failure reply.
pub const ERROR_PREFIX: &str = "❌ ";

/// Build the instruction sent to the provider for one dream.
pub fn dream_prompt(style: &str, dialogue: &str) -> String {
    let task = format!(
        "你的任务是阅读以下的对话片段，然后以【{}】的风格，创作一段文字。作品需要捕捉对话中隐藏的情绪、关键词和内在联系，但不要直接引用或总结对话内容，而是进行艺术化、抽象化的再创作。\n",
        style
    );

    format!(
        "{}{}{}--- 对话素材 ---\n{}\n--- 素材结束 ---\n\n{}",
        DREAM_PERSONA, task, DREAM_MOOD, dialogue, DREAM_CUE
    )
}

const DREAM_PERSONA: &str =
    "你是一位名为“入梦师”的艺术家，擅长将人们的对话转化为充满想象力的艺术作品。\n";

const DREAM_MOOD: &str = "让作品充满美感、意象，甚至可以有些怪诞，就像一个真实的梦。\n\n";

const DREAM_CUE: &str = "现在，请开始你的创作：";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_style_and_dialogue() {
        let prompt = dream_prompt("蒸汽朋克", "- hi\n- there");

        assert!(prompt.starts_with(DREAM_PERSONA));
        assert!(prompt.contains("以【蒸汽朋克】的风格"));
        assert!(prompt.contains("--- 对话素材 ---\n- hi\n- there\n--- 素材结束 ---\n\n"));
        assert!(prompt.ends_with(DREAM_CUE));
    }
}
