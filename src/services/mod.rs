pub mod ai_service;
pub mod normalizer;
pub mod paragraph_store;
pub mod phrases;
pub mod prompts;
pub mod report_writer;
pub mod segmenter;
pub mod similarity;

pub use ai_service::AiService;
pub use normalizer::{post_process, strip_reasoning};
pub use paragraph_store::{ParagraphStore, ProjectStore};
pub use report_writer::{format_chapter_corrections_as_text, highlight_diff, parse_export_mode, ExportMode, ReportWriter};
pub use segmenter::{extract_corrections, extract_corrections_with};
pub use similarity::{validate_corrections, SimilarityValidator};
