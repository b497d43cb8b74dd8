//! 段落分组
//!
//! 把一章中待修正的段落切成若干个提示词批次。组内段落索引连续，
//! 原文总长度不超过 `chunk_size`；单个超长段落单独成组。

use std::ops::Range;

use crate::models::Paragraph;

/// 一个段落组：输入切片中的一段连续范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphGroup {
    pub range: Range<usize>,
}

impl ParagraphGroup {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn paragraphs<'a>(&self, all: &'a [Paragraph]) -> &'a [Paragraph] {
        &all[self.range.clone()]
    }

    pub fn paragraphs_mut<'a>(&self, all: &'a mut [Paragraph]) -> &'a mut [Paragraph] {
        &mut all[self.range.clone()]
    }
}

/// 按字符数和索引连续性分组
pub fn chunk_paragraphs(paragraphs: &[Paragraph], chunk_size: usize) -> Vec<ParagraphGroup> {
    let mut groups = Vec::new();
    let mut start = 0;
    let mut length = 0;

    for (i, paragraph) in paragraphs.iter().enumerate() {
        let chars = paragraph.original_text.chars().count();

        if i > start {
            let gap = paragraph.index != paragraphs[i - 1].index + 1;
            if gap || length + chars > chunk_size {
                groups.push(ParagraphGroup { range: start..i });
                start = i;
                length = 0;
            }
        }
        length += chars;
    }

    if start < paragraphs.len() {
        groups.push(ParagraphGroup {
            range: start..paragraphs.len(),
        });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(specs: &[(u32, usize)]) -> Vec<Paragraph> {
        specs
            .iter()
            .map(|(index, len)| Paragraph::new(1, *index, "x".repeat(*len)))
            .collect()
    }

    fn flatten(groups: &[ParagraphGroup], all: &[Paragraph]) -> Vec<u32> {
        groups
            .iter()
            .flat_map(|g| g.paragraphs(all).iter().map(|p| p.index))
            .collect()
    }

    #[test]
    fn test_groups_cover_input_in_order() {
        let all = paragraphs(&[(1, 40), (2, 40), (3, 40), (4, 40), (5, 40)]);
        let groups = chunk_paragraphs(&all, 100);

        assert_eq!(flatten(&groups, &all), vec![1, 2, 3, 4, 5]);
        assert!(groups.iter().all(|g| !g.is_empty()));
        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![2, 2, 1]);
    }

    #[test]
    fn test_index_gap_starts_new_group() {
        let all = paragraphs(&[(1, 5), (2, 5), (5, 5), (6, 5)]);
        let groups = chunk_paragraphs(&all, 1000);

        assert_eq!(groups.len(), 2);
        for group in &groups {
            let indices: Vec<u32> = group.paragraphs(&all).iter().map(|p| p.index).collect();
            assert!(indices.windows(2).all(|w| w[1] == w[0] + 1));
        }
    }

    #[test]
    fn test_oversized_paragraph_forms_own_group() {
        let all = paragraphs(&[(1, 10), (2, 500), (3, 10)]);
        let groups = chunk_paragraphs(&all, 100);

        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![1, 1, 1]);
        assert_eq!(flatten(&groups, &all), vec![1, 2, 3]);
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let all = vec![Paragraph::new(1, 1, "é".repeat(6)), Paragraph::new(1, 2, "é".repeat(4))];
        assert_eq!(chunk_paragraphs(&all, 10).len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_paragraphs(&[], 100).is_empty());
    }
}
