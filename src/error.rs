use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 修正流程错误
    #[error("修正错误: {0}")]
    Correction(#[from] CorrectionError),
    /// 持久化错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 响应解析失败：所有回退策略后段落数量仍不匹配
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("响应分段数量不匹配: 期望 {expected}, 实际 {actual}")]
pub struct ParseError {
    pub expected: usize,
    pub actual: usize,
}

/// 修正结果校验失败
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// 后处理后仍像是模型的说明文字
    #[error("修正结果看起来是模型的说明文字: {preview}")]
    Commentary { preview: String },
    /// 整批编辑距离不合理
    #[error("相似度校验失败 (阈值: {threshold})")]
    Dissimilar { threshold: f64 },
    /// 原文非空但修正结果过短
    #[error("段落 {index} 的修正结果过短 ({chars} 字符)")]
    TooShort { index: u32, chars: usize },
}

/// 修正流程错误
#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// 技术重试预算耗尽且没有可用的历史结果
    #[error("技术重试已耗尽 (共尝试 {attempts} 次): {last_error}")]
    TechnicalExhaustion { attempts: usize, last_error: String },
    /// 模型调用失败（不区分子类型，原样传播）
    #[error("模型调用失败: {0}")]
    Model(#[source] anyhow::Error),
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

/// 持久化错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 找不到对应的段落
    #[error("找不到段落 (章节: {chapter_id}, 索引: {index})")]
    NotFound { chapter_id: i64, index: u32 },
    /// 写入项目文件失败
    #[error("写入项目文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 稿件内容无效
    #[error("稿件无效: {reason}")]
    InvalidManuscript { reason: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {message}")]
    FileParseFailed { path: String, message: String },
}

// ========== 便捷构造函数 ==========

impl CorrectionError {
    /// 创建模型调用错误
    pub fn model(source: anyhow::Error) -> Self {
        CorrectionError::Model(source)
    }

    /// 解析/校验失败可以在本地用技术重试恢复
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CorrectionError::Parse(_) | CorrectionError::Validation(_))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Other(format!("{:#}", err))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message_carries_counts() {
        let err = CorrectionError::from(ParseError { expected: 3, actual: 1 });
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("期望 3"));
        assert!(err.to_string().contains("实际 1"));
    }

    #[test]
    fn test_model_error_is_not_recoverable() {
        let err = CorrectionError::model(anyhow::anyhow!("connection refused"));
        assert!(!err.is_recoverable());
        let app: AppError = err.into();
        assert!(app.to_string().contains("connection refused"));
    }

    #[test]
    fn test_anyhow_context_chain_is_kept() {
        let err = anyhow::anyhow!("permission denied").context("无法写入修正报告");
        let app = AppError::from(err);
        assert!(matches!(app, AppError::Other(_)));
        assert!(app.to_string().contains("无法写入修正报告: permission denied"));
    }
}
