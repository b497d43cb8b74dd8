//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 项目处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载稿件（TOML 项目或纯文本）
//! - 控制章节并发数量（buffer_unordered）
//! - 持有 AiService（任务队列）
//! - 输出修正报告和全局统计信息
//!
//! ### `chapter_processor` - 单个章节处理器
//! - 挑选待修正段落并分组（Vec<ParagraphGroup>）
//! - 复用 CorrectionFlow 处理每个段落组
//! - 某一组失败时记录日志并继续
//! - 生成章节摘要
//! - 输出单个章节的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Chapter>)
//!     ↓
//! chapter_processor (处理 Vec<ParagraphGroup>)
//!     ↓
//! workflow::CorrectionFlow (处理单个 ParagraphGroup)
//!     ↓
//! services (能力层：ai / segmenter / normalizer / similarity / store / report)
//!     ↓
//! infrastructure (基础设施：JobQueue)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管项目，chapter_processor 管单个章节
//! 2. **资源隔离**：只有编排层创建 AiService 和任务队列
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体修正判断

pub mod batch_processor;
pub mod chapter_processor;

// 重新导出主要类型
pub use batch_processor::App;
pub use chapter_processor::{ChapterProcessor, ChapterStats};
