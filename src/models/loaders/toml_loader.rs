use crate::models::project::Project;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 项目文件加载 Project
pub async fn load_project(toml_file_path: &Path) -> Result<Project> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取项目文件: {}", toml_file_path.display()))?;

    let project: Project = toml::from_str(&content)
        .with_context(|| format!("无法解析项目文件: {}", toml_file_path.display()))?;

    tracing::info!(
        "成功加载项目 {}: {} 个章节, {} 个段落",
        project.name,
        project.chapters.len(),
        project.paragraph_count()
    );

    Ok(project)
}

/// 将 Project 序列化为 TOML 文本
pub fn project_to_toml(project: &Project) -> Result<String> {
    toml::to_string_pretty(project).context("无法序列化项目")
}

/// 将 Project 写回 TOML 项目文件
pub async fn save_project(project: &Project, toml_file_path: &Path) -> Result<()> {
    let content = project_to_toml(project)?;
    fs::write(toml_file_path, content)
        .await
        .with_context(|| format!("无法写入项目文件: {}", toml_file_path.display()))?;
    tracing::debug!("项目已保存: {}", toml_file_path.display());
    Ok(())
}
