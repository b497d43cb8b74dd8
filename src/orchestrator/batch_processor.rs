//! 项目处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责整个稿件的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建模型客户端、任务队列（AiService）
//! 2. **稿件加载**：TOML 项目文件，或纯文本稿件导入为新项目
//! 3. **并发控制**：`buffer_unordered` 限制同时处理的章节数
//! 4. **章节摘要**：按配置自动生成
//! 5. **结果输出**：修正报告 + 项目文件
//! 6. **全局统计**：汇总所有章节的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个章节的细节
//! - **资源所有者**：唯一持有 AiService（任务队列）的模块
//! - **串行模型调用**：章节并发只影响调度，模型调用始终由任务队列逐个执行

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::{stream, StreamExt};
use tracing::{info, warn};

use crate::clients::{ModelClient, OllamaClient, OpenAiCompatClient};
use crate::config::{Config, CorrectionSettings, ModelBackend};
use crate::error::{AppResult, FileError};
use crate::models::{create_project, load_plain_text, load_project, Project};
use crate::orchestrator::chapter_processor::{ChapterProcessor, ChapterStats};
use crate::services::{parse_export_mode, AiService, ParagraphStore, ProjectStore, ReportWriter};
use crate::utils::logging::{log_project_loaded, log_startup, print_final_stats};
use crate::workflow::CorrectionFlow;

/// 应用主结构
pub struct App {
    config: Config,
    ai: Arc<AiService>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        log_startup(&config);

        let client: Arc<dyn ModelClient> = match config.model_backend {
            ModelBackend::Ollama => {
                let ollama = OllamaClient::new(&config.ollama_base_url);
                check_ollama(&ollama, &config.selected_model).await;
                Arc::new(ollama)
            }
            ModelBackend::OpenAi => Arc::new(OpenAiCompatClient::new(
                &config.llm_api_key,
                &config.llm_api_base_url,
            )),
        };

        Ok(Self::with_client(config, client))
    }

    /// 使用指定的模型客户端创建应用（必须在 tokio 运行时内调用）
    pub fn with_client(config: Config, client: Arc<dyn ModelClient>) -> Self {
        let mut ai = AiService::from_config(client, &config);
        if config.selected_model.trim().is_empty() {
            warn!("⚠️ 未配置模型，使用默认模型 deepseek-r1:32b");
            ai.configure_model("deepseek-r1:32b");
        }

        info!("🤖 当前模型: {}", ai.model());

        Self {
            config,
            ai: Arc::new(ai),
        }
    }

    /// 运行应用主逻辑，返回全部章节的汇总统计
    pub async fn run(&self) -> AppResult<ChapterStats> {
        let mut project = self.load_manuscript().await?;

        if project.chapters.is_empty() {
            warn!("⚠️ 稿件中没有章节，程序结束");
            return Ok(ChapterStats::default());
        }

        log_project_loaded(
            &project.name,
            project.chapters.len(),
            project.paragraph_count(),
            self.config.max_concurrent_chapters,
        );

        let store = Arc::new(ProjectStore::new(
            project.clone(),
            Some(PathBuf::from(&self.config.project_output_path)),
        ));

        let stats = self.process_all_chapters(&mut project, &store).await;

        let mode = parse_export_mode(&self.config.report_export_mode)?;
        ReportWriter::with_path(&self.config.report_output_file)
            .with_mode(mode)
            .write(&project)
            .await?;
        store.save().await?;

        print_final_stats(
            stats.succeeded,
            stats.failed,
            stats.groups,
            stats.changed,
            &self.config.report_output_file,
        );

        Ok(stats)
    }

    /// 加载稿件：`.toml` 为已有项目，其余按纯文本导入
    async fn load_manuscript(&self) -> AppResult<Project> {
        let path = Path::new(&self.config.manuscript_path);
        info!("\n📁 正在加载稿件: {}", path.display());

        if !path.exists() {
            return Err(FileError::NotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        if path.extension().is_some_and(|ext| ext == "toml") {
            return Ok(load_project(path).await?);
        }

        let drafts = load_plain_text(path).await?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "manuscript".to_string());

        let project = create_project(&name, "", self.config.correction_strength.level(), drafts)?;
        Ok(project)
    }

    /// 项目自带的强度和风格提示优先于全局配置
    fn settings_for(&self, project: &Project) -> CorrectionSettings {
        let mut settings = self.config.correction_settings();
        if let Some(strength) = project.correction_strength() {
            settings.strength = strength;
        }
        let style = project.style_prompt.trim();
        if !style.is_empty() {
            settings.style_prompt = Some(style.to_string());
        }
        settings
    }

    /// 处理所有章节
    async fn process_all_chapters(&self, project: &mut Project, store: &Arc<ProjectStore>) -> ChapterStats {
        let flow = CorrectionFlow::new(Arc::clone(&self.ai), self.settings_for(project));
        let paragraph_store: Arc<dyn ParagraphStore> = store.clone();
        let processor = ChapterProcessor::new(
            flow,
            Arc::clone(&self.ai),
            paragraph_store,
            self.config.summary_char_limit,
        );

        let processor = &processor;
        let force = self.config.force_recorrect;
        let auto_summaries = self.config.auto_summaries;

        let results: Vec<ChapterStats> = stream::iter(project.chapters.iter_mut())
            .map(|chapter| async move {
                let stats = processor.correct_chapter(chapter, force).await;

                if auto_summaries && (chapter.summary.is_none() || stats.changed > 0) {
                    match processor.summarize_chapter(chapter).await {
                        Ok(summary) => {
                            if let Err(e) = store.set_chapter_summary(chapter.id, summary).await {
                                warn!("[章节 {}] ⚠️ 摘要保存失败: {}", chapter.chapter_index, e);
                            }
                        }
                        Err(e) => warn!("[章节 {}] ⚠️ {:#}", chapter.chapter_index, e),
                    }
                }

                stats
            })
            .buffer_unordered(self.config.max_concurrent_chapters.max(1))
            .collect()
            .await;

        let mut total = ChapterStats::default();
        for stats in &results {
            total.merge(stats);
        }
        total
    }
}

/// 启动时检查 Ollama 是否可用、模型是否已下载（只记录日志）
async fn check_ollama(client: &OllamaClient, model: &str) {
    match client.version().await {
        Ok(version) => info!("✓ Ollama 版本: {}", version),
        Err(e) => {
            warn!("⚠️ 无法连接 Ollama: {:#}", e);
            return;
        }
    }

    match client.list_models().await {
        Ok(models) if models.iter().any(|m| m.name == model) => {
            info!("✓ 模型已就绪: {}", model);
        }
        Ok(models) => {
            let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
            warn!("⚠️ 未找到模型 {}，本地可用模型: {:?}", model, names);
        }
        Err(e) => warn!("⚠️ 无法获取模型列表: {:#}", e),
    }
}
