use serde::{Deserialize, Serialize};

use crate::config::CorrectionStrength;
use crate::error::FileError;

/// 段落修正状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CorrectionStatus {
    /// 尚未生成修正
    #[default]
    NotGenerated,
    /// AI 已生成修正，等待人工处理
    Generated,
    /// 人工已查看
    Reviewed,
    /// 人工已接受
    Accepted,
    /// 人工已拒绝
    Rejected,
    /// 无需修正
    NotRequired,
}

impl CorrectionStatus {
    /// 人工确认过的状态，修正流程不能覆盖
    pub fn is_human_authoritative(self) -> bool {
        matches!(self, CorrectionStatus::Accepted | CorrectionStatus::Reviewed)
    }
}

/// 段落：修正的基本单位
///
/// `(chapter_id, index)` 是稳定标识，`original_text` 创建后不再改变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub chapter_id: i64,
    pub index: u32,
    pub original_text: String,
    /// 最近一次被接受的 AI 修正
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_text: Option<String>,
    /// 人工修正（优先于 AI 修正）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manually_corrected_text: Option<String>,
    /// 仅用于渲染的前置空行数
    #[serde(default)]
    pub leading_space: u32,
    #[serde(default)]
    pub correction_status: CorrectionStatus,
}

impl Paragraph {
    pub fn new(chapter_id: i64, index: u32, original_text: impl Into<String>) -> Self {
        Self {
            chapter_id,
            index,
            original_text: original_text.into(),
            corrected_text: None,
            manually_corrected_text: None,
            leading_space: 0,
            correction_status: CorrectionStatus::NotGenerated,
        }
    }

    /// 当前生效的文本：人工修正 > AI 修正 > 原文
    pub fn effective_text(&self) -> &str {
        self.manually_corrected_text
            .as_deref()
            .or(self.corrected_text.as_deref())
            .unwrap_or(&self.original_text)
    }

    /// 应用一轮修正的最终结果
    ///
    /// 结果与原文相同则清空 `corrected_text`；人工接受/查看过的状态保持不变。
    pub fn apply_correction(&mut self, chosen: &str) {
        if chosen == self.original_text {
            self.corrected_text = None;
            if !self.correction_status.is_human_authoritative() {
                self.correction_status = CorrectionStatus::NotRequired;
            }
        } else {
            self.corrected_text = Some(chosen.to_string());
            if self.correction_status != CorrectionStatus::Accepted {
                self.manually_corrected_text = None;
            }
            if matches!(
                self.correction_status,
                CorrectionStatus::NotGenerated
                    | CorrectionStatus::Rejected
                    | CorrectionStatus::NotRequired
            ) {
                self.correction_status = CorrectionStatus::Generated;
            }
        }

        if self.manually_corrected_text.is_some()
            && self.manually_corrected_text == self.corrected_text
        {
            self.manually_corrected_text = None;
        }
    }
}

/// 章节
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: i64,
    pub chapter_index: u32,
    pub name: String,
    /// AI 生成的章节摘要
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

impl Chapter {
    /// 需要人工处理的段落索引（AI 已生成修正但尚未处理）
    pub fn paragraphs_needing_action(&self) -> Vec<u32> {
        self.paragraphs
            .iter()
            .filter(|p| p.correction_status == CorrectionStatus::Generated)
            .map(|p| p.index)
            .collect()
    }
}

/// 项目：所有章节和段落的根
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub style_prompt: String,
    pub correction_strength_level: u8,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Project {
    pub fn correction_strength(&self) -> Option<CorrectionStrength> {
        CorrectionStrength::from_level(self.correction_strength_level)
    }

    pub fn paragraph_count(&self) -> usize {
        self.chapters.iter().map(|c| c.paragraphs.len()).sum()
    }
}

/// 导入时解析出的章节草稿
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterDraft {
    pub title: String,
    pub paragraphs: Vec<ParagraphDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphDraft {
    pub text: String,
    pub leading_space: u32,
}

/// 从导入的章节草稿创建项目
///
/// 章节 id 与章节序号都从 1 开始，段落索引在每章内重新编号。
pub fn create_project(
    name: &str,
    style_prompt: &str,
    correction_strength_level: u8,
    chapters: Vec<ChapterDraft>,
) -> Result<Project, FileError> {
    if CorrectionStrength::from_level(correction_strength_level).is_none() {
        return Err(FileError::InvalidManuscript {
            reason: format!("修正强度必须在 1 到 3 之间 (当前: {})", correction_strength_level),
        });
    }

    let parsed_chapters: Vec<Chapter> = chapters
        .into_iter()
        .enumerate()
        .map(|(i, draft)| {
            let chapter_id = i as i64 + 1;
            let paragraphs = draft
                .paragraphs
                .into_iter()
                .enumerate()
                .map(|(j, p)| Paragraph {
                    leading_space: p.leading_space,
                    ..Paragraph::new(chapter_id, j as u32 + 1, p.text)
                })
                .collect();
            Chapter {
                id: chapter_id,
                chapter_index: i as u32 + 1,
                name: draft.title,
                summary: None,
                paragraphs,
            }
        })
        .collect();

    if parsed_chapters.is_empty() {
        return Err(FileError::InvalidManuscript {
            reason: "稿件中没有找到任何章节".to_string(),
        });
    }

    Ok(Project {
        id: 1,
        name: name.to_string(),
        style_prompt: style_prompt.to_string(),
        correction_strength_level,
        chapters: parsed_chapters,
    })
}
