/// 模型客户端抽象
///
/// 给定模型 id 和消息，返回生成的文本或错误
use anyhow::Result;
use async_trait::async_trait;

/// 生成参数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    /// 上下文窗口大小（token）
    pub context_window: Option<u32>,
    /// 模型保持加载的秒数
    pub keep_alive_secs: Option<u64>,
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// 后端名称（用于日志）
    fn provider(&self) -> &'static str;

    /// 发送一条用户消息，返回模型生成的文本
    async fn complete(&self, model: &str, prompt: &str, options: &GenerationOptions)
        -> Result<String>;
}
