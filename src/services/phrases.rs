//! 模型常见"套话"识别
//!
//! 内置英文短语表，可通过 [`TextConventions`] 追加其他语言的短语

use phf::phf_set;

use crate::config::TextConventions;

/// 模型在正文前加的开场白（小写前缀匹配）
static PREAMBLE_PREFIXES: phf::Set<&'static str> = phf_set! {
    "here are the corrected",
    "here is the corrected",
    "here's the corrected",
    "here are the corrections",
    "here is the correction",
    "here are the revised",
    "here is the revised",
    "here's the revised",
    "here are the edited",
    "here is the edited",
    "here's the edited",
    "here is your corrected",
    "here are your corrected",
    "sure, here",
    "sure! here",
    "certainly! here",
    "certainly, here",
    "corrected text:",
    "corrected paragraphs:",
    "corrected version:",
};

/// 表示"无需修改"的整句回复（已去掉首尾标点、小写）
static NO_CHANGE_PHRASES: phf::Set<&'static str> = phf_set! {
    "no corrections needed",
    "no corrections are needed",
    "no correction needed",
    "no corrections necessary",
    "no corrections required",
    "no changes needed",
    "no changes are needed",
    "no changes necessary",
    "no changes required",
    "no changes",
    "no errors found",
    "no errors",
    "the text is correct",
    "this paragraph is correct",
    "no corrections needed for this paragraph",
    "unchanged",
};

/// 是否以开场白开头
pub fn is_preamble(text: &str, conventions: &TextConventions) -> bool {
    let lower = text.trim().to_lowercase();
    PREAMBLE_PREFIXES.iter().any(|p| lower.starts_with(p))
        || conventions
            .extra_preamble_phrases
            .iter()
            .any(|p| !p.is_empty() && lower.starts_with(&p.to_lowercase()))
}

/// 是否是"无需修改"的回复
pub fn is_no_change_phrase(text: &str, conventions: &TextConventions) -> bool {
    let normalized = text
        .trim()
        .trim_matches(|c: char| matches!(c, '.' | '!' | '(' | ')' | '[' | ']' | '*' | '"'))
        .trim()
        .to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    NO_CHANGE_PHRASES.contains(normalized.as_str())
        || conventions
            .extra_no_change_phrases
            .iter()
            .any(|p| p.trim().to_lowercase() == normalized)
}

/// 是否像模型对修改内容的总结，而不是正文
pub fn looks_like_summary(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    (lower.contains("issues") && lower.contains("provided") && lower.contains("corrections"))
        || lower.starts_with("here is the corrected")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_prefix_is_case_insensitive() {
        let conventions = TextConventions::default();
        assert!(is_preamble("Here is the corrected text:", &conventions));
        assert!(is_preamble("  SURE, here you go", &conventions));
        assert!(!is_preamble("Here is the door, she said.", &conventions));
    }

    #[test]
    fn test_extra_phrases_extend_builtin_lists() {
        let conventions = TextConventions {
            extra_preamble_phrases: vec!["Voici le texte".to_string()],
            extra_no_change_phrases: vec!["Aucune correction".to_string()],
            ..Default::default()
        };
        assert!(is_preamble("voici le texte corrigé :", &conventions));
        assert!(is_no_change_phrase("Aucune correction.", &conventions));
        assert!(!is_no_change_phrase("Aucune correction.", &TextConventions::default()));
    }

    #[test]
    fn test_no_change_phrase_ignores_wrapping_punctuation() {
        let conventions = TextConventions::default();
        assert!(is_no_change_phrase("(No changes needed.)", &conventions));
        assert!(is_no_change_phrase("**No corrections needed**", &conventions));
        assert!(!is_no_change_phrase("No changes were made to the old house.", &conventions));
    }

    #[test]
    fn test_summary_heuristic() {
        assert!(looks_like_summary(
            "I fixed the issues in the provided text; corrections are below."
        ));
        assert!(!looks_like_summary("The issues were provided by the council."));
    }
}
