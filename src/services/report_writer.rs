//! 修正报告导出 - 业务能力层
//!
//! 只负责把章节的修正整理成文本，不关心修正流程

use anyhow::{Context, Result};
use similar::{DiffTag, TextDiff};
use tracing::{debug, warn};

use crate::models::{Chapter, CorrectionStatus, Project};

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// 原文、修正和高亮差异一起列出
    CorrectionsWithOriginal,
}

pub fn parse_export_mode(mode: &str) -> Result<ExportMode> {
    match mode {
        "correctionsWithOriginal" => Ok(ExportMode::CorrectionsWithOriginal),
        other => anyhow::bail!("未知的导出格式: {}", other),
    }
}

/// 把修正后文本中的改动部分用 `*` 包起来
///
/// 连续的改动合并成一段；纯删除的位置留下 `**`。
pub fn highlight_diff(original: &str, updated: &str) -> String {
    let diff = TextDiff::from_chars(original, updated);
    let new_slices = diff.new_slices();

    let mut out = String::with_capacity(updated.len() + 8);
    let mut changed = String::new();
    let mut in_change = false;

    for op in diff.ops() {
        let (tag, _, new_range) = op.as_tag_tuple();
        let text: String = new_slices[new_range].concat();
        if tag == DiffTag::Equal {
            if in_change {
                out.push('*');
                out.push_str(&changed);
                out.push('*');
                changed.clear();
                in_change = false;
            }
            out.push_str(&text);
        } else {
            changed.push_str(&text);
            in_change = true;
        }
    }
    if in_change {
        out.push('*');
        out.push_str(&changed);
        out.push('*');
    }

    out
}

/// 把单个章节的修正整理为文本
///
/// 开头提示需要人工检查的段落数，然后逐条列出已接受的修正
pub fn format_chapter_corrections_as_text(chapter: &Chapter, mode: ExportMode) -> String {
    let mut text = String::new();

    let unhandled = chapter.paragraphs_needing_action();
    if !unhandled.is_empty() {
        text.push_str(&format!(
            "This chapter has {} paragraphs that need manual checking!\n\n",
            unhandled.len()
        ));
    }

    let accepted: Vec<_> = chapter
        .paragraphs
        .iter()
        .filter(|p| p.correction_status == CorrectionStatus::Accepted)
        .collect();

    text.push_str(&format!(
        "Listing {} paragraph(s) that have corrections.\n",
        accepted.len()
    ));

    for paragraph in accepted {
        text.push('\n');
        for _ in 0..paragraph.leading_space {
            text.push('\n');
        }
        text.push_str(&format!("Paragraph {}:\n", paragraph.index));

        match mode {
            ExportMode::CorrectionsWithOriginal => {
                let corrected = paragraph.effective_text();
                text.push_str(&format!("Original: {}\n", paragraph.original_text));
                text.push_str(&format!("Correction: {}\n", corrected));
                text.push_str("\nCorrection highlighted:\n");
                text.push_str(&highlight_diff(&paragraph.original_text, corrected));
                text.push_str("\n---\n");
            }
        }
    }

    text
}

/// 修正报告写入服务
pub struct ReportWriter {
    report_file_path: String,
    mode: ExportMode,
}

impl ReportWriter {
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            report_file_path: path.into(),
            mode: ExportMode::CorrectionsWithOriginal,
        }
    }

    pub fn with_mode(mut self, mode: ExportMode) -> Self {
        self.mode = mode;
        self
    }

    /// 整个项目的报告：每章一个标题，后面跟章节报告
    pub fn render(&self, project: &Project) -> String {
        let mut text = format!("{}\n", project.name);
        for chapter in &project.chapters {
            text.push_str(&format!("\n=== {} ===\n", chapter.name));
            if let Some(summary) = &chapter.summary {
                text.push_str(&format!("Summary: {}\n\n", summary));
            }
            text.push_str(&format_chapter_corrections_as_text(chapter, self.mode));
        }
        text
    }

    /// 写入报告文件（覆盖）
    pub async fn write(&self, project: &Project) -> Result<()> {
        let report = self.render(project);
        debug!(
            "写入修正报告: {} ({} 字符)",
            self.report_file_path,
            report.len()
        );

        tokio::fs::write(&self.report_file_path, report)
            .await
            .with_context(|| format!("无法写入修正报告: {}", self.report_file_path))
            .inspect_err(|e| warn!("{:#}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Paragraph;

    fn chapter_with(paragraphs: Vec<Paragraph>) -> Chapter {
        Chapter {
            id: 1,
            chapter_index: 1,
            name: "Chapter 1".to_string(),
            summary: None,
            paragraphs,
        }
    }

    #[test]
    fn test_highlight_marks_inserted_text() {
        assert_eq!(highlight_diff("He walkd home.", "He walked home."), "He walk*e*d home.");
        assert_eq!(highlight_diff("Same.", "Same."), "Same.");
    }

    #[test]
    fn test_parse_export_mode() {
        assert_eq!(
            parse_export_mode("correctionsWithOriginal").unwrap(),
            ExportMode::CorrectionsWithOriginal
        );
        assert!(parse_export_mode("pdf").is_err());
    }

    #[test]
    fn test_chapter_report_lists_accepted_and_counts_pending() {
        let mut accepted = Paragraph::new(1, 1, "He walkd home.");
        accepted.corrected_text = Some("He walked home.".to_string());
        accepted.correction_status = CorrectionStatus::Accepted;

        let mut pending = Paragraph::new(1, 2, "It raind.");
        pending.corrected_text = Some("It rained.".to_string());
        pending.correction_status = CorrectionStatus::Generated;

        let text = format_chapter_corrections_as_text(
            &chapter_with(vec![accepted, pending]),
            ExportMode::CorrectionsWithOriginal,
        );

        assert!(text.starts_with("This chapter has 1 paragraphs that need manual checking!"));
        assert!(text.contains("Listing 1 paragraph(s) that have corrections."));
        assert!(text.contains("Paragraph 1:\nOriginal: He walkd home.\nCorrection: He walked home.\n"));
        assert!(text.contains("He walk*e*d home.\n---\n"));
        assert!(!text.contains("It raind."));
    }

    #[test]
    fn test_chapter_without_pending_has_no_warning() {
        let text = format_chapter_corrections_as_text(
            &chapter_with(vec![Paragraph::new(1, 1, "Fine.")]),
            ExportMode::CorrectionsWithOriginal,
        );
        assert_eq!(text, "Listing 0 paragraph(s) that have corrections.\n");
    }
}
