//! 提示词模板
//!
//! 指令按修正强度区分；段落之间用 `---` 分隔，末尾再追加一个 `---`
//! 防止模型把最后一段和它自己的补充说明连在一起。

use crate::config::CorrectionStrength;
use crate::services::segmenter::SEPARATOR;

fn strength_instructions(strength: CorrectionStrength) -> &'static str {
    match strength {
        CorrectionStrength::Low => {
            "Correct only clear spelling mistakes, typos and punctuation errors. \
             Do not change wording, style or sentence structure."
        }
        CorrectionStrength::Medium => {
            "Correct spelling, grammar and punctuation errors. \
             You may fix awkward word choices when they are clearly wrong, \
             but keep the author's voice, style and sentence structure."
        }
        CorrectionStrength::Max => {
            "Correct spelling, grammar and punctuation errors and improve clumsy phrasing \
             and readability. Keep the meaning, the author's voice and the paragraph's length \
             roughly the same."
        }
    }
}

/// 渲染一组段落的修正提示词
pub fn render_correction_prompt(
    strength: CorrectionStrength,
    style_prompt: Option<&str>,
    paragraphs: &[&str],
) -> String {
    let style = match style_prompt.map(str::trim).filter(|s| !s.is_empty()) {
        Some(style) => format!("\nStyle notes from the editor: {}\n", style),
        None => String::new(),
    };

    let body = paragraphs.join(&format!("\n{}\n", SEPARATOR));

    format!(
        r#"You are a careful copy editor working on a book manuscript.
{instructions}
{style}
The text below contains {count} paragraph(s) separated by lines containing only "{sep}".
Return exactly {count} corrected paragraph(s) in the same order, separated the same way.
If a paragraph needs no correction, return it unchanged.
Do not add any introduction, explanation, notes or summary.

{body}
{sep}"#,
        instructions = strength_instructions(strength),
        style = style,
        count = paragraphs.len(),
        sep = SEPARATOR,
        body = body,
    )
}

/// 渲染章节摘要提示词
pub fn render_summary_prompt(chapter_name: &str, chapter_text: &str) -> String {
    format!(
        r#"Summarize the following book chapter in a few sentences.
Mention the main characters, places and events. Reply with the summary only.

Chapter: {}

{}"#,
        chapter_name, chapter_text
    )
}
