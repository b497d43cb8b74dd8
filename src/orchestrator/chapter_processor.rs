//! 单个章节处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理单个章节的所有待修正段落，是章节级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **挑选段落**：未生成修正的段落（强制模式下为人工未确认的全部段落）
//! 2. **分组**：按位置连续切出区间，再按字符数分组
//! 3. **流程调度**：复用同一个 `CorrectionFlow` 处理每一组
//! 4. **容错**：某一组失败只记录日志，继续处理后面的组
//! 5. **章节摘要**：经同一个任务队列生成
//! 6. **统计输出**：记录成功/失败/修改数量

use std::ops::Range;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::models::{Chapter, CorrectionStatus, Paragraph};
use crate::services::prompts::render_summary_prompt;
use crate::services::{AiService, ParagraphStore};
use crate::utils::logging::truncate_text;
use crate::workflow::{chunk_paragraphs, CorrectionFlow, GroupCtx};

/// 章节处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChapterStats {
    pub groups: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 有修改的段落数
    pub changed: usize,
    pub unchanged: usize,
    pub model_calls: usize,
}

impl ChapterStats {
    pub fn merge(&mut self, other: &ChapterStats) {
        self.groups += other.groups;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.changed += other.changed;
        self.unchanged += other.unchanged;
        self.model_calls += other.model_calls;
    }
}

/// 章节处理器
pub struct ChapterProcessor {
    flow: CorrectionFlow,
    ai: Arc<AiService>,
    store: Arc<dyn ParagraphStore>,
    summary_char_limit: usize,
}

impl ChapterProcessor {
    pub fn new(
        flow: CorrectionFlow,
        ai: Arc<AiService>,
        store: Arc<dyn ParagraphStore>,
        summary_char_limit: usize,
    ) -> Self {
        Self {
            flow,
            ai,
            store,
            summary_char_limit,
        }
    }

    /// 修正一个章节
    ///
    /// `force` 为 true 时重新修正除人工接受/查看以外的所有段落
    pub async fn correct_chapter(&self, chapter: &mut Chapter, force: bool) -> ChapterStats {
        let mut stats = ChapterStats::default();
        let chapter_index = chapter.chapter_index;

        let runs = pending_runs(&chapter.paragraphs, force);
        let pending: usize = runs.iter().map(|r| r.len()).sum();

        log_chapter_start(chapter_index, &chapter.name, chapter.paragraphs.len(), pending);

        if pending == 0 {
            info!("[章节 {}] 没有需要修正的段落", chapter_index);
            return stats;
        }

        let chunk_size = self.flow.settings().chunk_size;

        for run in runs {
            let run_paragraphs = &mut chapter.paragraphs[run];
            let groups = chunk_paragraphs(run_paragraphs, chunk_size);
            debug!(
                "[章节 {}] 连续区间 {} 段，分为 {} 组",
                chapter_index,
                run_paragraphs.len(),
                groups.len()
            );

            for group in groups {
                let paragraphs = group.paragraphs_mut(run_paragraphs);
                let (Some(first), Some(last)) = (paragraphs.first(), paragraphs.last()) else {
                    continue;
                };
                let ctx = GroupCtx::new(chapter.id, chapter_index, first.index, last.index);

                stats.groups += 1;
                match self.flow.run(paragraphs, &ctx, self.store.as_ref()).await {
                    Ok(report) => {
                        stats.succeeded += 1;
                        stats.changed += report.changed;
                        stats.unchanged += report.unchanged;
                        stats.model_calls += report.calls;
                    }
                    Err(e) => {
                        error!("{} ❌ 段落组修正失败，已跳过: {}", ctx, e);
                        stats.failed += 1;
                    }
                }
            }
        }

        log_chapter_complete(chapter_index, &stats);
        stats
    }

    /// 生成章节摘要并写入 `chapter.summary`
    pub async fn summarize_chapter(&self, chapter: &mut Chapter) -> Result<String> {
        let text = chapter_text(chapter, self.summary_char_limit);
        info!(
            "[章节 {}] 📝 正在生成章节摘要 ({} 字符)",
            chapter.chapter_index,
            text.chars().count()
        );

        let summary = self
            .ai
            .prompt_chat(render_summary_prompt(&chapter.name, &text))
            .wait()
            .await
            .with_context(|| format!("章节 {} 摘要生成失败", chapter.chapter_index))?
            .trim()
            .to_string();

        info!(
            "[章节 {}] ✓ 摘要: {}",
            chapter.chapter_index,
            truncate_text(&summary, 80)
        );
        chapter.summary = Some(summary.clone());
        Ok(summary)
    }
}

/// 待修正段落在章节中的连续位置区间
fn pending_runs(paragraphs: &[Paragraph], force: bool) -> Vec<Range<usize>> {
    let is_pending = |p: &Paragraph| {
        if force {
            !p.correction_status.is_human_authoritative()
        } else {
            p.correction_status == CorrectionStatus::NotGenerated
        }
    };

    let mut runs: Vec<Range<usize>> = Vec::new();
    for (pos, paragraph) in paragraphs.iter().enumerate() {
        if !is_pending(paragraph) {
            continue;
        }
        match runs.last_mut() {
            Some(run) if run.end == pos => run.end = pos + 1,
            _ => runs.push(pos..pos + 1),
        }
    }
    runs
}

/// 摘要用的章节文本：标题 + 各段当前文本，按字符数截断
fn chapter_text(chapter: &Chapter, char_limit: usize) -> String {
    let mut text = format!("{}\n\n", chapter.name);
    for paragraph in &chapter.paragraphs {
        text.push_str(paragraph.effective_text());
        text.push_str("\n\n");
    }
    text.chars().take(char_limit).collect::<String>().trim_end().to_string()
}

// ========== 日志辅助函数 ==========

fn log_chapter_start(chapter_index: u32, name: &str, total: usize, pending: usize) {
    info!("\n[章节 {}] {}", chapter_index, "─".repeat(30));
    info!("[章节 {}] 开始处理: {}", chapter_index, name);
    info!(
        "[章节 {}] 段落总数: {}, 待修正: {}",
        chapter_index, total, pending
    );
}

fn log_chapter_complete(chapter_index: u32, stats: &ChapterStats) {
    info!(
        "[章节 {}] 段落组统计: 成功 {}, 失败 {}, 总计 {}",
        chapter_index, stats.succeeded, stats.failed, stats.groups
    );
    info!(
        "[章节 {}] ✅ 章节处理完成 (有修改 {} 段, 无需修改 {} 段)",
        chapter_index, stats.changed, stats.unchanged
    );
}
