//! # Manuscript Corrector
//!
//! 使用本地大模型批量修正书稿的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（模型调用通道），只暴露能力
//! - `JobQueue` - 唯一的后台 worker，所有模型调用按提交顺序逐个执行
//! - `clients/` - 模型客户端（Ollama 原生 API / 兼容 OpenAI 的 API）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个段落或单次响应
//! - `AiService` - 提交提示词、拿回响应
//! - `segmenter` / `normalizer` / `similarity` - 分段、后处理、相似度校验
//! - `ParagraphStore` - 段落持久化
//! - `ReportWriter` - 写修正报告
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个段落组"的完整修正流程
//! - `GroupCtx` - 上下文封装（章节 + 段落区间）
//! - `CorrectionFlow` - 状态机（提示 → 解析 → 校验 → 重试/重跑 → 投票）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 项目处理器，管理资源和章节并发
//! - `orchestrator/chapter_processor` - 单个章节处理器，遍历段落组
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, CorrectionSettings};
pub use error::{AppError, AppResult, CorrectionError};
pub use infrastructure::{JobHandle, JobQueue};
pub use models::{Chapter, CorrectionStatus, Paragraph, Project};
pub use orchestrator::{App, ChapterProcessor, ChapterStats};
pub use workflow::{CorrectionFlow, GroupCtx};
