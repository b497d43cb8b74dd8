//! 段落组修正流程 - 流程层
//!
//! 核心职责：定义"一个段落组"的完整修正流程
//!
//! 流程顺序：
//! 1. 渲染提示词 → 提交到任务队列 → 等待响应
//! 2. 分段 → 逐段后处理 → 相似度校验 → 长度校验
//! 3. 失败消耗技术重试；成功记入历史，视情况重跑
//! 4. 多数投票选出最终结果 → 写回段落 → 持久化

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::CorrectionSettings;
use crate::error::{CorrectionError, ParseError, ValidationError};
use crate::models::Paragraph;
use crate::services::normalizer::{post_process, strip_reasoning};
use crate::services::prompts::render_correction_prompt;
use crate::services::segmenter::extract_corrections_with;
use crate::services::similarity::SimilarityValidator;
use crate::services::{AiService, ParagraphStore};
use crate::utils::logging::truncate_text;
use crate::workflow::group_ctx::GroupCtx;
use crate::workflow::history::CorrectionHistory;

/// 单次模型响应的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// 通过全部校验的修正，与组内段落一一对应
    Accepted(Vec<String>),
    ParseFailed(ParseError),
    ValidationFailed(ValidationError),
}

/// 一个段落组的处理结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupReport {
    /// 模型调用次数
    pub calls: usize,
    /// 最终结果与原文不同的段落数
    pub changed: usize,
    pub unchanged: usize,
    /// 技术重试耗尽后退回到了历史结果
    pub degraded: bool,
}

/// 段落组修正流程
///
/// - 编排"提示 → 解析 → 校验 → 接受/重试/重跑"的状态机
/// - 不关心章节如何分组
/// - 只依赖业务能力（services）
pub struct CorrectionFlow {
    ai: Arc<AiService>,
    settings: CorrectionSettings,
}

impl CorrectionFlow {
    pub fn new(ai: Arc<AiService>, settings: CorrectionSettings) -> Self {
        Self { ai, settings }
    }

    pub fn settings(&self) -> &CorrectionSettings {
        &self.settings
    }

    /// 修正一个段落组，完成后写回段落并持久化一次
    pub async fn run(
        &self,
        paragraphs: &mut [Paragraph],
        ctx: &GroupCtx,
        store: &dyn ParagraphStore,
    ) -> Result<GroupReport, CorrectionError> {
        let slots = paragraphs.len();
        if slots == 0 {
            return Ok(GroupReport::default());
        }

        let prompt = {
            let originals: Vec<&str> = paragraphs.iter().map(|p| p.original_text.as_str()).collect();
            render_correction_prompt(
                self.settings.strength,
                self.settings.style_prompt.as_deref(),
                &originals,
            )
        };

        let retry_ceiling = self.settings.technical_retries;
        let mut retries_left = retry_ceiling;
        let mut re_runs_left = self.settings.re_runs;
        let mut history = CorrectionHistory::with_capacity(self.settings.re_runs + 1, slots);
        let mut last_accepted: Option<Vec<String>> = None;
        let mut report = GroupReport::default();

        loop {
            report.calls += 1;
            debug!("{} 📨 第 {} 次提交 ({} 段)", ctx, report.calls, slots);

            let outcome = self
                .ai
                .prompt_chat(prompt.clone())
                .wait()
                .await
                .map(|response| self.attempt(paragraphs, &response));

            let failure = match outcome {
                Ok(AttemptOutcome::Accepted(corrections)) => {
                    retries_left = (retries_left + 1).min(retry_ceiling);
                    history.push(&corrections);

                    let no_op = paragraphs
                        .iter()
                        .zip(&corrections)
                        .all(|(p, c)| p.original_text == *c);
                    last_accepted = Some(corrections);

                    if no_op {
                        debug!("{} 模型未做任何修改", ctx);
                        history.clear();
                        break;
                    }
                    if history.converged() {
                        debug!("{} 最近两次结果一致，停止重跑", ctx);
                        break;
                    }
                    if re_runs_left == 0 {
                        break;
                    }
                    re_runs_left -= 1;
                    debug!("{} 🔁 重跑，剩余 {} 次", ctx, re_runs_left);
                    continue;
                }
                Ok(AttemptOutcome::ParseFailed(err)) => CorrectionError::from(err),
                Ok(AttemptOutcome::ValidationFailed(err)) => CorrectionError::from(err),
                Err(err) => CorrectionError::model(err),
            };

            if !failure.is_recoverable() {
                return Err(failure);
            }
            if !self.on_failure(ctx, &failure, &mut retries_left, &history, &report)? {
                report.degraded = true;
                break;
            }
        }

        let fallback = last_accepted.unwrap_or_default();
        let chosen = history.pick_best(&fallback);

        // 存储写入成功后才回写调用方的段落
        let mut updated = paragraphs.to_vec();
        for (paragraph, text) in updated.iter_mut().zip(&chosen) {
            if *text == paragraph.original_text {
                report.unchanged += 1;
            } else {
                report.changed += 1;
            }
            paragraph.apply_correction(text);
        }

        store.update_paragraphs(&updated).await?;
        paragraphs.clone_from_slice(&updated);

        info!(
            "{} ✓ 修正完成：{} 段有修改，{} 段无需修改（模型调用 {} 次）",
            ctx, report.changed, report.unchanged, report.calls
        );

        Ok(report)
    }

    /// 处理解析/校验失败
    ///
    /// 返回 true 表示继续重试；false 表示预算耗尽、改用历史结果
    fn on_failure(
        &self,
        ctx: &GroupCtx,
        reason: &CorrectionError,
        retries_left: &mut usize,
        history: &CorrectionHistory,
        report: &GroupReport,
    ) -> Result<bool, CorrectionError> {
        if *retries_left > 0 {
            *retries_left -= 1;
            warn!(
                "{} ⚠️ {}，技术重试（剩余 {} 次）",
                ctx, reason, *retries_left
            );
            return Ok(true);
        }

        if history.latest().is_some() {
            warn!("{} ⚠️ 技术重试已耗尽，使用最近一次历史结果: {}", ctx, reason);
            return Ok(false);
        }

        Err(CorrectionError::TechnicalExhaustion {
            attempts: report.calls,
            last_error: reason.to_string(),
        })
    }

    /// 处理一次模型响应：分段 → 后处理 → 相似度 → 长度
    pub fn attempt(&self, paragraphs: &[Paragraph], response: &str) -> AttemptOutcome {
        let response = strip_reasoning(response);
        let conventions = &self.settings.conventions;

        let originals: Vec<&str> = paragraphs.iter().map(|p| p.original_text.as_str()).collect();
        let candidates = match extract_corrections_with(&originals, &response, conventions) {
            Ok(candidates) => candidates,
            Err(err) => {
                debug!("无法分段的响应: {}", truncate_text(&response, 120));
                return AttemptOutcome::ParseFailed(err);
            }
        };

        let mut corrections = Vec::with_capacity(candidates.len());
        for (paragraph, candidate) in paragraphs.iter().zip(&candidates) {
            match post_process(&paragraph.original_text, candidate, conventions) {
                Ok(text) => corrections.push(text),
                Err(err) => return AttemptOutcome::ValidationFailed(err),
            }
        }

        let validator = SimilarityValidator {
            threshold: self.settings.similarity_threshold,
            all_must_pass: self.settings.similarity_all_must_pass,
            min_group_size: self.settings.similarity_min_group,
        };
        if validator.applies_to(paragraphs.len()) {
            if !validator.validate(&originals, &corrections) {
                return AttemptOutcome::ValidationFailed(ValidationError::Dissimilar {
                    threshold: validator.threshold,
                });
            }
        }

        for (paragraph, text) in paragraphs.iter().zip(&corrections) {
            let chars = text.chars().count();
            if !paragraph.original_text.trim().is_empty() && chars < self.settings.min_candidate_chars {
                return AttemptOutcome::ValidationFailed(ValidationError::TooShort {
                    index: paragraph.index,
                    chars,
                });
            }
        }

        AttemptOutcome::Accepted(corrections)
    }
}
