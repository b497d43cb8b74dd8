use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio_test::{assert_err, assert_ok};

use manuscript_corrector::clients::{GenerationOptions, ModelClient};
use manuscript_corrector::config::{Config, CorrectionSettings};
use manuscript_corrector::error::FileError;
use manuscript_corrector::models::{load_project, Chapter, CorrectionStatus, Paragraph, Project};
use manuscript_corrector::services::{AiService, ProjectStore};
use manuscript_corrector::workflow::{CorrectionFlow, GroupCtx};
use manuscript_corrector::{App, AppError, ChapterProcessor};

/// 按脚本依次返回响应的模型
struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    fn provider(&self) -> &'static str {
        "scripted"
    }

    async fn complete(&self, _: &str, _: &str, _: &GenerationOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted response left"))
    }
}

/// 按规则修正错别字的模型，同时记录同一时刻的最大并发调用数
struct TypoFixerModel {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl TypoFixerModel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ModelClient for TypoFixerModel {
    fn provider(&self) -> &'static str {
        "typo-fixer"
    }

    async fn complete(&self, _: &str, prompt: &str, _: &GenerationOptions) -> Result<String> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(5)).await;

        let response = if prompt.starts_with("Summarize") {
            "A short summary.".to_string()
        } else {
            let body = prompt
                .split_once("or summary.\n\n")
                .map(|(_, body)| body)
                .unwrap_or(prompt);
            format!(
                "<think>checking spelling</think>\n{}",
                body.replace("walkd", "walked")
                    .replace("raind", "rained")
                    .replace("cam.", "came.")
            )
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(response)
    }
}

fn chapter(texts: &[&str]) -> Chapter {
    Chapter {
        id: 1,
        chapter_index: 1,
        name: "Chapter One".to_string(),
        summary: None,
        paragraphs: texts
            .iter()
            .enumerate()
            .map(|(i, t)| Paragraph::new(1, i as u32 + 1, *t))
            .collect(),
    }
}

fn project_with(chapter: &Chapter) -> Project {
    Project {
        id: 1,
        name: "Test".to_string(),
        style_prompt: String::new(),
        correction_strength_level: 2,
        chapters: vec![chapter.clone()],
    }
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("manuscript_corrector_{}_{}", std::process::id(), name))
}

#[tokio::test]
async fn test_group_converges_after_identical_rerun() {
    let response = "He walked home.\n---\nIt rained all night.\n---\nThe end came.\n---";
    let model = ScriptedModel::new(&[response, response]);
    let ai = Arc::new(AiService::new(model.clone(), "test", GenerationOptions::default()));
    let flow = CorrectionFlow::new(
        ai,
        CorrectionSettings {
            re_runs: 1,
            ..Default::default()
        },
    );

    let mut chapter = chapter(&["He walkd home.", "It raind all night.", "The end cam."]);
    let store = ProjectStore::in_memory(project_with(&chapter));

    let report = assert_ok!(
        flow.run(&mut chapter.paragraphs, &GroupCtx::new(1, 1, 1, 3), &store)
            .await
    );

    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    assert_eq!(report.changed, 3);
    for (stored, expected) in store.snapshot().await.chapters[0]
        .paragraphs
        .iter()
        .zip(["He walked home.", "It rained all night.", "The end came."])
    {
        assert_eq!(stored.corrected_text.as_deref(), Some(expected));
        assert_eq!(stored.correction_status, CorrectionStatus::Generated);
    }
}

#[tokio::test]
async fn test_unchanged_response_marks_not_required_except_reviewed() {
    let model = ScriptedModel::new(&["Rain fell.\n---\nShe waited.\n---\nMorning came."]);
    let ai = Arc::new(AiService::new(model, "test", GenerationOptions::default()));
    let flow = CorrectionFlow::new(ai, CorrectionSettings::default());

    let mut chapter = chapter(&["Rain fell.", "She waited.", "Morning came."]);
    chapter.paragraphs[0].corrected_text = Some("Rain fell!".to_string());
    chapter.paragraphs[2].correction_status = CorrectionStatus::Reviewed;
    let store = ProjectStore::in_memory(project_with(&chapter));

    assert_ok!(
        flow.run(&mut chapter.paragraphs, &GroupCtx::new(1, 1, 1, 3), &store)
            .await
    );

    assert_eq!(chapter.paragraphs[0].corrected_text, None);
    assert_eq!(chapter.paragraphs[0].correction_status, CorrectionStatus::NotRequired);
    assert_eq!(chapter.paragraphs[1].correction_status, CorrectionStatus::NotRequired);
    assert_eq!(chapter.paragraphs[2].correction_status, CorrectionStatus::Reviewed);
}

#[tokio::test]
async fn test_failed_group_does_not_stop_chapter() {
    let model = ScriptedModel::new(&["garbage", "garbage", "Third paragraph hear."]);
    let ai = Arc::new(AiService::new(model.clone(), "test", GenerationOptions::default()));
    let flow = CorrectionFlow::new(
        Arc::clone(&ai),
        CorrectionSettings {
            re_runs: 0,
            technical_retries: 1,
            chunk_size: 50,
            ..Default::default()
        },
    );

    let mut chapter = chapter(&[
        "First paragraph here.",
        "Second paragraph here.",
        "Third paragraph here.",
    ]);
    let store = Arc::new(ProjectStore::in_memory(project_with(&chapter)));
    let processor = ChapterProcessor::new(flow, ai, store.clone(), 20_000);

    let stats = processor.correct_chapter(&mut chapter, false).await;

    assert_eq!(stats.groups, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    assert_eq!(chapter.paragraphs[0].correction_status, CorrectionStatus::NotGenerated);
    assert_eq!(chapter.paragraphs[2].correction_status, CorrectionStatus::Generated);

    let stored = store.paragraph(1, 3).await.unwrap();
    assert_eq!(stored.corrected_text.as_deref(), Some("Third paragraph hear."));
}

#[tokio::test]
async fn test_model_error_surfaces_to_caller() {
    let model = ScriptedModel::new(&[]);
    let ai = Arc::new(AiService::new(model, "test", GenerationOptions::default()));
    let flow = CorrectionFlow::new(ai, CorrectionSettings::default());

    let mut chapter = chapter(&["One.", "Two."]);
    let store = ProjectStore::in_memory(project_with(&chapter));

    assert_err!(
        flow.run(&mut chapter.paragraphs, &GroupCtx::new(1, 1, 1, 2), &store)
            .await
    );
}

#[tokio::test]
async fn test_app_corrects_plain_text_manuscript() {
    let manuscript = temp_path("novel.txt");
    let project_file = temp_path("novel.toml");
    let report_file = temp_path("report.txt");
    std::fs::write(
        &manuscript,
        "## Chapter One\n\nHe walkd home.\n\nIt raind.\n\n## Chapter Two\n\nThe end cam.\n\nNothing else happened.\n",
    )
    .unwrap();

    let config = Config {
        manuscript_path: manuscript.display().to_string(),
        project_output_path: project_file.display().to_string(),
        report_output_file: report_file.display().to_string(),
        correction_re_runs: 0,
        max_concurrent_chapters: 2,
        ..Default::default()
    };

    let model = TypoFixerModel::new();
    let app = App::with_client(config, model.clone());
    let stats = assert_ok!(app.run().await);

    assert_eq!(stats.groups, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.changed, 3);
    assert_eq!(stats.unchanged, 1);
    assert_eq!(model.max_in_flight.load(Ordering::SeqCst), 1);
    // 两次修正 + 两次摘要
    assert_eq!(model.calls.load(Ordering::SeqCst), 4);

    let saved = load_project(&project_file).await.unwrap();
    assert_eq!(saved.chapters.len(), 2);
    assert_eq!(
        saved.chapters[0].paragraphs[0].corrected_text.as_deref(),
        Some("He walked home.")
    );
    assert_eq!(
        saved.chapters[1].paragraphs[1].correction_status,
        CorrectionStatus::NotRequired
    );
    assert_eq!(saved.chapters[1].summary.as_deref(), Some("A short summary."));

    let report = std::fs::read_to_string(&report_file).unwrap();
    assert!(report.contains("This chapter has 2 paragraphs that need manual checking!"));

    for path in [manuscript, project_file, report_file] {
        let _ = std::fs::remove_file(path);
    }
}

#[tokio::test]
async fn test_missing_manuscript_is_a_file_error() {
    let config = Config {
        manuscript_path: temp_path("does_not_exist.txt").display().to_string(),
        ..Default::default()
    };

    let app = App::with_client(config, TypoFixerModel::new());
    let err = assert_err!(app.run().await);

    assert!(matches!(err, AppError::File(FileError::NotFound { .. })));
}
