//! 段落持久化
//!
//! 修正流程每完成一个段落组调用一次 `update_paragraphs`，
//! 写入量与段落组数量成正比，而不是段落数量。

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;
use crate::models::{save_project, Paragraph, Project};

/// 段落存储
#[async_trait]
pub trait ParagraphStore: Send + Sync {
    async fn update_paragraph(&self, paragraph: &Paragraph) -> Result<(), StoreError> {
        self.update_paragraphs(std::slice::from_ref(paragraph)).await
    }

    /// 批量更新；任何一个段落不存在时整批不写入
    async fn update_paragraphs(&self, paragraphs: &[Paragraph]) -> Result<(), StoreError>;
}

/// 以项目文件为后端的段落存储
///
/// 内存中保存一份项目副本；给定路径时每次更新后整体写回 TOML。
pub struct ProjectStore {
    project: Mutex<Project>,
    path: Option<PathBuf>,
}

impl ProjectStore {
    pub fn new(project: Project, path: Option<PathBuf>) -> Self {
        Self {
            project: Mutex::new(project),
            path,
        }
    }

    /// 只保存在内存中
    pub fn in_memory(project: Project) -> Self {
        Self::new(project, None)
    }

    /// 当前项目的副本
    pub async fn snapshot(&self) -> Project {
        self.project.lock().await.clone()
    }

    /// 读取单个段落
    pub async fn paragraph(&self, chapter_id: i64, index: u32) -> Option<Paragraph> {
        let project = self.project.lock().await;
        find_paragraph(&project, chapter_id, index).cloned()
    }

    /// 更新章节摘要
    pub async fn set_chapter_summary(&self, chapter_id: i64, summary: String) -> Result<(), StoreError> {
        let mut project = self.project.lock().await;
        let chapter = project
            .chapters
            .iter_mut()
            .find(|c| c.id == chapter_id)
            .ok_or(StoreError::NotFound {
                chapter_id,
                index: 0,
            })?;
        chapter.summary = Some(summary);
        self.write(&project).await
    }

    /// 把当前项目写回文件（没有路径时什么也不做）
    pub async fn save(&self) -> Result<(), StoreError> {
        let project = self.project.lock().await;
        self.write(&project).await
    }

    async fn write(&self, project: &Project) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        save_project(project, path)
            .await
            .map_err(|source| StoreError::WriteFailed {
                path: path.display().to_string(),
                source,
            })
    }
}

#[async_trait]
impl ParagraphStore for ProjectStore {
    async fn update_paragraphs(&self, paragraphs: &[Paragraph]) -> Result<(), StoreError> {
        let mut project = self.project.lock().await;

        if let Some(missing) = paragraphs
            .iter()
            .find(|p| find_paragraph(&project, p.chapter_id, p.index).is_none())
        {
            return Err(StoreError::NotFound {
                chapter_id: missing.chapter_id,
                index: missing.index,
            });
        }

        let mut updated = project.clone();
        for paragraph in paragraphs {
            if let Some(slot) = find_paragraph_mut(&mut updated, paragraph.chapter_id, paragraph.index) {
                *slot = paragraph.clone();
            }
        }

        // 文件写入失败时内存中的副本保持不变
        self.write(&updated).await?;
        *project = updated;

        debug!("已保存 {} 个段落", paragraphs.len());
        Ok(())
    }
}

fn find_paragraph(project: &Project, chapter_id: i64, index: u32) -> Option<&Paragraph> {
    project
        .chapters
        .iter()
        .find(|c| c.id == chapter_id)?
        .paragraphs
        .iter()
        .find(|p| p.index == index)
}

fn find_paragraph_mut(project: &mut Project, chapter_id: i64, index: u32) -> Option<&mut Paragraph> {
    project
        .chapters
        .iter_mut()
        .find(|c| c.id == chapter_id)?
        .paragraphs
        .iter_mut()
        .find(|p| p.index == index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{create_project, load_project, ChapterDraft, CorrectionStatus, ParagraphDraft};

    fn sample_project() -> Project {
        create_project(
            "Novel",
            "",
            2,
            vec![ChapterDraft {
                title: "Chapter 1".to_string(),
                paragraphs: vec![
                    ParagraphDraft {
                        text: "He walkd home.".to_string(),
                        leading_space: 0,
                    },
                    ParagraphDraft {
                        text: "It rained.".to_string(),
                        leading_space: 0,
                    },
                ],
            }],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_update_replaces_stored_paragraph() {
        let store = ProjectStore::in_memory(sample_project());
        let mut paragraph = store.paragraph(1, 1).await.unwrap();
        paragraph.apply_correction("He walked home.");

        store.update_paragraph(&paragraph).await.unwrap();

        let stored = store.paragraph(1, 1).await.unwrap();
        assert_eq!(stored.corrected_text.as_deref(), Some("He walked home."));
        assert_eq!(stored.correction_status, CorrectionStatus::Generated);
    }

    #[tokio::test]
    async fn test_unknown_paragraph_rejects_whole_batch() {
        let store = ProjectStore::in_memory(sample_project());
        let mut known = store.paragraph(1, 1).await.unwrap();
        known.apply_correction("He walked home.");
        let unknown = Paragraph::new(1, 99, "ghost");

        let err = store.update_paragraphs(&[known, unknown]).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { chapter_id: 1, index: 99 }));

        let untouched = store.paragraph(1, 1).await.unwrap();
        assert_eq!(untouched.corrected_text, None);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_memory_unchanged() {
        let path = std::env::temp_dir()
            .join(format!("paragraph_store_missing_dir_{}", std::process::id()))
            .join("project.toml");
        let store = ProjectStore::new(sample_project(), Some(path));

        let mut paragraph = store.paragraph(1, 1).await.unwrap();
        paragraph.apply_correction("He walked home.");

        let err = store.update_paragraph(&paragraph).await.unwrap_err();
        assert!(matches!(err, StoreError::WriteFailed { .. }));

        let untouched = store.paragraph(1, 1).await.unwrap();
        assert_eq!(untouched.corrected_text, None);
        assert_eq!(untouched.correction_status, CorrectionStatus::NotGenerated);
    }

    #[tokio::test]
    async fn test_store_with_path_writes_project_file() {
        let path = std::env::temp_dir().join(format!("paragraph_store_{}.toml", std::process::id()));
        let store = ProjectStore::new(sample_project(), Some(path.clone()));

        let mut paragraph = store.paragraph(1, 2).await.unwrap();
        paragraph.apply_correction("It was raining.");
        store.update_paragraph(&paragraph).await.unwrap();

        let reloaded = load_project(&path).await.unwrap();
        assert_eq!(
            reloaded.chapters[0].paragraphs[1].corrected_text.as_deref(),
            Some("It was raining.")
        );
        let _ = std::fs::remove_file(&path);
    }
}
