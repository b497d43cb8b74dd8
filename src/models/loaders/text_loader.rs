use crate::models::project::{ChapterDraft, ParagraphDraft};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 以这些前缀开头的行是注释/备注，不进入稿件
const REMARK_PREFIXES: [&str; 5] = ["note:", "remark:", "skip:", "footer:", "chapter notes"];

/// 读取纯文本稿件
pub async fn load_plain_text(path: &Path) -> Result<Vec<ChapterDraft>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取稿件: {}", path.display()))?;
    let chapters = parse_plain_text(&content);
    tracing::info!("从 {} 解析出 {} 个章节", path.display(), chapters.len());
    Ok(chapters)
}

/// 解析纯文本稿件
///
/// - `## 标题` 或 `Chapter ...` 开始新章节
/// - 空行分隔段落，多个连续空行记为 leading_space = 1
/// - 标题为 preface / afterword 的章节被跳过
pub fn parse_plain_text(content: &str) -> Vec<ChapterDraft> {
    let mut chapters: Vec<ChapterDraft> = Vec::new();
    let mut current: Option<ChapterDraft> = None;
    let mut buffer: Vec<&str> = Vec::new();
    let mut blank_run = 0usize;
    let mut pending_space = 0u32;

    for line in content.lines() {
        let trimmed = line.trim();

        if let Some(title) = heading_title(trimmed) {
            flush_paragraph(&mut current, &mut buffer, &mut pending_space);
            if let Some(chapter) = current.take() {
                chapters.push(chapter);
            }
            current = Some(ChapterDraft {
                title: title.to_string(),
                paragraphs: Vec::new(),
            });
            blank_run = 0;
            continue;
        }

        if trimmed.is_empty() {
            flush_paragraph(&mut current, &mut buffer, &mut pending_space);
            blank_run += 1;
            continue;
        }

        let lower = trimmed.to_lowercase();
        if REMARK_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            continue;
        }

        if buffer.is_empty() {
            let has_paragraphs = current.as_ref().is_some_and(|c| !c.paragraphs.is_empty());
            if blank_run > 1 && has_paragraphs {
                pending_space = 1;
            }
        }
        blank_run = 0;

        if current.is_none() {
            current = Some(ChapterDraft {
                title: "Chapter 1".to_string(),
                paragraphs: Vec::new(),
            });
        }
        buffer.push(trimmed);
    }

    flush_paragraph(&mut current, &mut buffer, &mut pending_space);
    if let Some(chapter) = current.take() {
        chapters.push(chapter);
    }

    chapters.retain(|c| {
        let title = c.title.to_lowercase();
        title != "preface" && title != "afterword" && !c.paragraphs.is_empty()
    });
    chapters
}

fn heading_title(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix("## ") {
        return Some(rest.trim());
    }
    let lower = line.to_lowercase();
    if lower.starts_with("chapter ") && line.split_whitespace().count() <= 8 && !line.ends_with('.') {
        return Some(line);
    }
    None
}

fn flush_paragraph(
    current: &mut Option<ChapterDraft>,
    buffer: &mut Vec<&str>,
    pending_space: &mut u32,
) {
    if buffer.is_empty() {
        return;
    }
    if let Some(chapter) = current.as_mut() {
        chapter.paragraphs.push(ParagraphDraft {
            text: buffer.join(" "),
            leading_space: *pending_space,
        });
    }
    buffer.clear();
    *pending_space = 0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chapters_and_paragraphs() {
        let text = "## Preface\n\nSkip me.\n\n## The Storm\n\nRain fell\nall night.\n\nNote: check this\nShe waited.\n\n\n\nMorning came.\n\nChapter 2\n\nIt ended.\n";
        let chapters = parse_plain_text(text);

        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "The Storm");
        let texts: Vec<&str> = chapters[0].paragraphs.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["Rain fell all night.", "She waited.", "Morning came."]);
        assert_eq!(chapters[0].paragraphs[1].leading_space, 0);
        assert_eq!(chapters[0].paragraphs[2].leading_space, 1);
        assert_eq!(chapters[1].title, "Chapter 2");
        assert_eq!(chapters[1].paragraphs.len(), 1);
    }

    #[test]
    fn test_text_without_headings_becomes_one_chapter() {
        let chapters = parse_plain_text("First.\n\nSecond.");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].paragraphs.len(), 2);
    }
}
