pub mod loaders;
pub mod project;

pub use loaders::{load_plain_text, load_project, save_project};
pub use project::{
    create_project, Chapter, ChapterDraft, CorrectionStatus, Paragraph, ParagraphDraft, Project,
};
