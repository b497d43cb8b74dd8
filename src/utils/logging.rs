/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；否则默认 info，`verbose` 时为 debug
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // 测试中可能重复初始化
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 稿件修正模式 ({})", now());
    info!(
        "🤖 模型: {} ({:?})",
        config.selected_model, config.model_backend
    );
    info!(
        "⚙️ 修正强度: {:?}, 重跑: {}, 技术重试: {}",
        config.correction_strength, config.correction_re_runs, config.technical_retries
    );
    info!("📊 最大并发章节数: {}", config.max_concurrent_chapters);
    info!("{}", "=".repeat(60));
}

/// 记录稿件加载信息
pub fn log_project_loaded(name: &str, chapters: usize, paragraphs: usize, max_concurrent: usize) {
    info!("✓ 项目 {}: {} 个章节, {} 个段落", name, chapters, paragraphs);
    info!("📋 最多同时处理 {} 个章节", max_concurrent);
    info!("💡 模型调用始终按提交顺序逐个执行\n");
}

/// 打印最终统计信息
///
/// # 参数
/// - `succeeded` / `failed` / `groups`: 段落组数量
/// - `changed`: 有修改的段落数
/// - `report_path`: 修正报告路径
pub fn print_final_stats(
    succeeded: usize,
    failed: usize,
    groups: usize,
    changed: usize,
    report_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!("完成时间: {}", now());
    info!("{}", "=".repeat(60));
    info!("✅ 成功段落组: {}/{}", succeeded, groups);
    info!("❌ 失败段落组: {}", failed);
    info!("✏️ 有修改的段落: {}", changed);
    info!("{}", "=".repeat(60));
    info!("\n修正报告已保存至: {}", report_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("第一章的内容", 3), "第一章...");
    }
}
