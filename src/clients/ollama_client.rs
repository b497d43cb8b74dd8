/// Ollama API 客户端
///
/// 使用原生 /api/chat 接口，支持 keep_alive 与 num_ctx
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clients::model_client::{GenerationOptions, ModelClient};

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
    #[serde(skip_serializing_if = "ChatOptions::is_empty")]
    options: ChatOptions,
}

#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
}

impl ChatOptions {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.num_ctx.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
    #[serde(default)]
    total_duration: u64,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

/// /api/tags 返回的模型条目
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// 查询 Ollama 版本
    pub async fn version(&self) -> Result<String> {
        #[derive(Deserialize)]
        struct VersionResp {
            version: String,
        }

        let url = format!("{}/api/version", self.base_url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("failed to call ollama version endpoint")?
            .error_for_status()
            .context("ollama version returned non-success status")?
            .json::<VersionResp>()
            .await
            .context("failed to decode ollama version response")?;

        Ok(response.version)
    }

    /// 列出本地可用模型（按名称排序）
    pub async fn list_models(&self) -> Result<Vec<ModelEntry>> {
        #[derive(Deserialize)]
        struct TagsResp {
            models: Vec<ModelEntry>,
        }

        let url = format!("{}/api/tags", self.base_url);
        let mut models = self
            .client
            .get(url)
            .send()
            .await
            .context("failed to call ollama tags endpoint")?
            .error_for_status()
            .context("ollama tags returned non-success status")?
            .json::<TagsResp>()
            .await
            .context("failed to decode ollama tags response")?
            .models;

        models.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(models)
    }

    fn build_request<'a>(
        model: &'a str,
        prompt: &'a str,
        options: &GenerationOptions,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            keep_alive: options.keep_alive_secs.map(|secs| format!("{}s", secs)),
            options: ChatOptions {
                temperature: options.temperature,
                num_ctx: options.context_window,
            },
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    fn provider(&self) -> &'static str {
        "ollama"
    }

    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        debug!("调用 Ollama /api/chat，模型: {}", model);
        debug!("用户消息长度: {} 字符", prompt.len());

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(url)
            .json(&Self::build_request(model, prompt, options))
            .send()
            .await
            .context("failed to call ollama chat endpoint")?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Ollama API 调用失败: {} {}", status, body.trim());
            anyhow::bail!("ollama /api/chat returned {status}: {}", normalize_err_body(&body));
        }

        let response = response
            .json::<ChatResponse>()
            .await
            .context("failed to decode ollama chat response")?;

        debug!(
            "Ollama API 耗时: {:.2} 秒",
            response.total_duration as f64 / 1_000_000_000.0
        );

        Ok(response.message.content)
    }
}

fn normalize_err_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(err) = json.get("error").and_then(|v| v.as_str()) {
            return err.to_string();
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_keep_alive_and_options() {
        let options = GenerationOptions {
            temperature: Some(0.2),
            context_window: Some(8192),
            keep_alive_secs: Some(300),
        };
        let request = OllamaClient::build_request("llama3", "fix this", &options);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["keep_alive"], "300s");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_ctx"], 8192);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_request_omits_unset_fields() {
        let request = OllamaClient::build_request("llama3", "fix this", &GenerationOptions::default());
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("keep_alive"));
        assert!(!json.contains("options"));
    }

    #[test]
    fn test_error_body_prefers_json_error_field() {
        assert_eq!(normalize_err_body(r#"{"error":"model not found"}"#), "model not found");
        assert_eq!(normalize_err_body("  "), "<empty body>");
    }

    #[tokio::test]
    #[ignore] // 需要本地运行 Ollama：cargo test -- --ignored
    async fn test_ollama_connectivity() {
        let _ = tracing_subscriber::fmt::try_init();
        let client = OllamaClient::new("http://localhost:11434");
        let version = client.version().await.unwrap();
        println!("Ollama 版本: {}", version);
        let models = client.list_models().await.unwrap();
        println!("可用模型: {}", models.len());
    }
}
