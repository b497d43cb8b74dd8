//! 段落组处理上下文
//!
//! 封装"我正在处理哪一章的哪几段"这一信息

use std::fmt::Display;

/// 段落组处理上下文
#[derive(Debug, Clone)]
pub struct GroupCtx {
    pub chapter_id: i64,

    /// 章节序号（仅用于日志显示）
    pub chapter_index: u32,

    /// 组内第一个段落的索引
    pub first_index: u32,

    /// 组内最后一个段落的索引
    pub last_index: u32,
}

impl GroupCtx {
    pub fn new(chapter_id: i64, chapter_index: u32, first_index: u32, last_index: u32) -> Self {
        Self {
            chapter_id,
            chapter_index,
            first_index,
            last_index,
        }
    }

    pub fn paragraph_count(&self) -> u32 {
        self.last_index - self.first_index + 1
    }
}

impl Display for GroupCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[章节 {} 段落 {}-{}]",
            self.chapter_index, self.first_index, self.last_index
        )
    }
}
