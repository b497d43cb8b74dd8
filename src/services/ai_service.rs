//! AI 服务 - 业务能力层
//!
//! 持有任务队列和模型客户端，对外只暴露"发一条消息，拿一个任务句柄"

use std::sync::Arc;

use tracing::{debug, info};

use crate::clients::{GenerationOptions, ModelClient};
use crate::config::Config;
use crate::infrastructure::{JobHandle, JobQueue};
use crate::services::normalizer::strip_reasoning;

/// AI 服务
///
/// 职责：
/// - 所有模型调用都经由同一个 [`JobQueue`] 串行执行
/// - 记录当前使用的模型和生成参数
/// - 去掉推理模型输出的思考过程
/// - 不关心段落、章节和重试
pub struct AiService {
    queue: JobQueue,
    client: Arc<dyn ModelClient>,
    model: String,
    options: GenerationOptions,
}

impl AiService {
    pub fn new(client: Arc<dyn ModelClient>, model: impl Into<String>, options: GenerationOptions) -> Self {
        Self {
            queue: JobQueue::new(),
            client,
            model: model.into(),
            options,
        }
    }

    /// 按配置创建（必须在 tokio 运行时内调用）
    pub fn from_config(client: Arc<dyn ModelClient>, config: &Config) -> Self {
        Self::new(
            client,
            config.selected_model.clone(),
            GenerationOptions {
                temperature: config.temperature,
                context_window: config.context_window,
                keep_alive_secs: config.keep_alive_secs,
            },
        )
    }

    /// 切换当前模型，之后提交的任务使用新模型
    pub fn configure_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
        info!("当前模型已切换为: {}", self.model);
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// 提交一条消息，返回任务句柄
    ///
    /// 调用方 `wait()` 之前任务就已经在队列中排队。
    pub fn prompt_chat(&self, message: String) -> JobHandle<String> {
        let client = Arc::clone(&self.client);
        let model = self.model.clone();
        let options = self.options.clone();

        debug!(
            "提交模型任务 ({} / {})，队列中: {}",
            client.provider(),
            model,
            self.queue.pending()
        );

        self.queue.submit(async move {
            let response = client.complete(&model, &message, &options).await?;
            Ok(strip_reasoning(&response))
        })
    }
}
