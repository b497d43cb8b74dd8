//! 程序配置
//!
//! 加载顺序：默认值 → TOML 配置文件（可选）→ 环境变量

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// 默认配置文件名
const DEFAULT_CONFIG_FILE: &str = "corrector.toml";

/// 模型后端
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// 本地 Ollama（原生 API，支持 keep_alive）
    Ollama,
    /// 兼容 OpenAI API 的服务
    OpenAi,
}

impl ModelBackend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Some(ModelBackend::Ollama),
            "openai" => Some(ModelBackend::OpenAi),
            _ => None,
        }
    }
}

/// 修正强度，决定发送哪一版指令提示词
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionStrength {
    Low,
    Medium,
    Max,
}

impl CorrectionStrength {
    /// 项目文件中的强度等级（1..=3）
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(CorrectionStrength::Low),
            2 => Some(CorrectionStrength::Medium),
            3 => Some(CorrectionStrength::Max),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            CorrectionStrength::Low => 1,
            CorrectionStrength::Medium => 2,
            CorrectionStrength::Max => 3,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "1" => Some(CorrectionStrength::Low),
            "medium" | "2" => Some(CorrectionStrength::Medium),
            "max" | "3" => Some(CorrectionStrength::Max),
            _ => None,
        }
    }
}

/// 与语言相关的文本约定
///
/// 内置的英文短语表始终生效，这里的列表只做补充。
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConventions {
    /// 额外的"AI 开场白"前缀（小写匹配）
    pub extra_preamble_phrases: Vec<String>,
    /// 额外的"无需修改"短语（整句匹配）
    pub extra_no_change_phrases: Vec<String>,
    /// 是否按原文统一引号/撇号风格
    pub unify_quotes: bool,
    /// 是否启用英式引号标点判定
    pub british_punctuation: bool,
}

impl Default for TextConventions {
    fn default() -> Self {
        Self {
            extra_preamble_phrases: Vec::new(),
            extra_no_change_phrases: Vec::new(),
            unify_quotes: true,
            british_punctuation: true,
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 模型配置 ---
    pub model_backend: ModelBackend,
    pub ollama_base_url: String,
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub selected_model: String,
    /// 模型保持加载的秒数（None 表示使用服务端默认值）
    pub keep_alive_secs: Option<u64>,
    pub temperature: Option<f32>,
    pub context_window: Option<u32>,
    // --- 修正配置 ---
    pub correction_strength: CorrectionStrength,
    /// 额外重跑次数（用于多数投票）
    pub correction_re_runs: usize,
    /// 每个段落组的最大字符数
    pub chunk_size: usize,
    /// 技术重试预算（解析/校验失败）
    pub technical_retries: usize,
    pub similarity_threshold: f64,
    pub similarity_all_must_pass: bool,
    /// 段落组至少多少段才做相似度校验
    pub similarity_min_group: usize,
    /// 原文非空时修正结果的最小字符数
    pub min_candidate_chars: usize,
    pub auto_summaries: bool,
    pub summary_char_limit: usize,
    /// 同时处理的章节数量（模型调用仍由任务队列串行）
    pub max_concurrent_chapters: usize,
    /// 重新修正除人工接受/查看以外的所有段落
    pub force_recorrect: bool,
    pub text_conventions: TextConventions,
    // --- 输入输出 ---
    pub manuscript_path: String,
    pub project_output_path: String,
    pub report_output_file: String,
    /// 修正报告格式（目前只有 correctionsWithOriginal）
    pub report_export_mode: String,
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_backend: ModelBackend::Ollama,
            ollama_base_url: "http://localhost:11434".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "http://localhost:11434/v1".to_string(),
            selected_model: "deepseek-r1:32b".to_string(),
            keep_alive_secs: Some(300),
            temperature: Some(0.2),
            context_window: Some(8192),
            correction_strength: CorrectionStrength::Medium,
            correction_re_runs: 2,
            chunk_size: 1000,
            technical_retries: 3,
            similarity_threshold: 0.5,
            similarity_all_must_pass: false,
            similarity_min_group: 3,
            min_candidate_chars: 2,
            auto_summaries: true,
            summary_char_limit: 20_000,
            max_concurrent_chapters: 4,
            force_recorrect: false,
            text_conventions: TextConventions::default(),
            manuscript_path: "manuscript.txt".to_string(),
            project_output_path: "project.toml".to_string(),
            report_output_file: "corrections.txt".to_string(),
            report_export_mode: "correctionsWithOriginal".to_string(),
            verbose_logging: false,
        }
    }
}

/// 单次修正调用使用的不可变参数包
#[derive(Clone, Debug)]
pub struct CorrectionSettings {
    pub strength: CorrectionStrength,
    pub style_prompt: Option<String>,
    pub re_runs: usize,
    pub chunk_size: usize,
    pub technical_retries: usize,
    pub similarity_threshold: f64,
    pub similarity_all_must_pass: bool,
    pub similarity_min_group: usize,
    pub min_candidate_chars: usize,
    pub conventions: TextConventions,
}

impl Default for CorrectionSettings {
    fn default() -> Self {
        Config::default().correction_settings()
    }
}

impl Config {
    /// 加载配置：`CONFIG_FILE`（或当前目录下的 corrector.toml）+ 环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = if Path::new(&path).exists() {
            debug!("读取配置文件: {}", path);
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };
        base.apply_env()
    }

    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadFailed {
            path: path.to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|e| ConfigError::FileParseFailed {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 只用环境变量覆盖默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// 用环境变量覆盖已有配置
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        Ok(Self {
            model_backend: match std::env::var("MODEL_BACKEND") {
                Ok(v) => ModelBackend::from_str(&v).ok_or_else(|| ConfigError::EnvVarParseFailed {
                    var_name: "MODEL_BACKEND".to_string(),
                    value: v.clone(),
                    expected_type: "ollama | openai".to_string(),
                })?,
                Err(_) => self.model_backend,
            },
            ollama_base_url: std::env::var("OLLAMA_BASE_URL").unwrap_or(self.ollama_base_url),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            selected_model: std::env::var("LLM_MODEL_NAME").unwrap_or(self.selected_model),
            keep_alive_secs: env_parse("KEEP_ALIVE_SECS")?.or(self.keep_alive_secs),
            temperature: env_parse("LLM_TEMPERATURE")?.or(self.temperature),
            context_window: env_parse("LLM_CONTEXT_WINDOW")?.or(self.context_window),
            correction_strength: match std::env::var("CORRECTION_STRENGTH") {
                Ok(v) => CorrectionStrength::from_str(&v).ok_or_else(|| {
                    ConfigError::EnvVarParseFailed {
                        var_name: "CORRECTION_STRENGTH".to_string(),
                        value: v.clone(),
                        expected_type: "low | medium | max".to_string(),
                    }
                })?,
                Err(_) => self.correction_strength,
            },
            correction_re_runs: env_parse("CORRECTION_RE_RUNS")?.unwrap_or(self.correction_re_runs),
            chunk_size: env_parse("CHUNK_SIZE")?.unwrap_or(self.chunk_size),
            technical_retries: env_parse("TECHNICAL_RETRIES")?.unwrap_or(self.technical_retries),
            similarity_threshold: env_parse("SIMILARITY_THRESHOLD")?.unwrap_or(self.similarity_threshold),
            similarity_all_must_pass: env_parse("SIMILARITY_ALL_MUST_PASS")?
                .unwrap_or(self.similarity_all_must_pass),
            similarity_min_group: env_parse("SIMILARITY_MIN_GROUP")?.unwrap_or(self.similarity_min_group),
            min_candidate_chars: env_parse("MIN_CANDIDATE_CHARS")?.unwrap_or(self.min_candidate_chars),
            auto_summaries: env_parse("AUTO_SUMMARIES")?.unwrap_or(self.auto_summaries),
            summary_char_limit: env_parse("SUMMARY_CHAR_LIMIT")?.unwrap_or(self.summary_char_limit),
            max_concurrent_chapters: env_parse("MAX_CONCURRENT_CHAPTERS")?
                .unwrap_or(self.max_concurrent_chapters),
            force_recorrect: env_parse("FORCE_RECORRECT")?.unwrap_or(self.force_recorrect),
            text_conventions: self.text_conventions,
            manuscript_path: std::env::var("MANUSCRIPT_PATH").unwrap_or(self.manuscript_path),
            project_output_path: std::env::var("PROJECT_OUTPUT_PATH").unwrap_or(self.project_output_path),
            report_output_file: std::env::var("REPORT_OUTPUT_FILE").unwrap_or(self.report_output_file),
            report_export_mode: std::env::var("REPORT_EXPORT_MODE").unwrap_or(self.report_export_mode),
            verbose_logging: env_parse("VERBOSE_LOGGING")?.unwrap_or(self.verbose_logging),
        })
    }

    /// 生成交给编排器的参数包
    pub fn correction_settings(&self) -> CorrectionSettings {
        if self.chunk_size == 0 {
            warn!("chunk_size 为 0，每个段落将单独成组");
        }
        CorrectionSettings {
            strength: self.correction_strength,
            style_prompt: None,
            re_runs: self.correction_re_runs,
            chunk_size: self.chunk_size,
            technical_retries: self.technical_retries,
            similarity_threshold: self.similarity_threshold,
            similarity_all_must_pass: self.similarity_all_must_pass,
            similarity_min_group: self.similarity_min_group,
            min_candidate_chars: self.min_candidate_chars,
            conventions: self.text_conventions.clone(),
        }
    }
}

/// 读取并解析环境变量；不存在时返回 None，解析失败时报错
fn env_parse<T: std::str::FromStr>(var_name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            }),
        Err(_) => Ok(None),
    }
}
