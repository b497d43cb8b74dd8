pub mod batching;
pub mod correction_flow;
pub mod group_ctx;
pub mod history;

pub use batching::{chunk_paragraphs, ParagraphGroup};
pub use correction_flow::{AttemptOutcome, CorrectionFlow, GroupReport};
pub use group_ctx::GroupCtx;
pub use history::CorrectionHistory;
