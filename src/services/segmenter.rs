//! 模型响应分段
//!
//! 把一次响应切成与输入段落一一对应的修正文本。模型经常多出开场白、
//! 重复段落或者把分隔符换成破折号/空行，这里按固定顺序逐个尝试回退策略。

use tracing::debug;

use crate::config::TextConventions;
use crate::error::ParseError;
use crate::services::phrases::{is_preamble, looks_like_summary};
use crate::services::similarity::relative_distance;

/// 主分隔符
pub const SEPARATOR: &str = "---";
/// 模型偶尔会把 `---` 写成破折号
const ALT_SEPARATOR: &str = "—";

/// 按内置短语表切分
pub fn extract_corrections(expected: usize, response: &str) -> Result<Vec<String>, ParseError> {
    extract(expected, None, response, &TextConventions::default())
}

/// 按组内原文切分响应，返回与 `originals` 一一对应的修正
///
/// 首段原文本身像开场白时，与它相近的首个片段不会被当作开场白丢掉。
pub fn extract_corrections_with(
    originals: &[&str],
    response: &str,
    conventions: &TextConventions,
) -> Result<Vec<String>, ParseError> {
    extract(originals.len(), originals.first().copied(), response, conventions)
}

fn extract(
    expected: usize,
    first_original: Option<&str>,
    response: &str,
    conventions: &TextConventions,
) -> Result<Vec<String>, ParseError> {
    if expected == 0 {
        return Ok(Vec::new());
    }

    let first_pass = split_trimmed(response, SEPARATOR).len();

    for separator in [SEPARATOR, ALT_SEPARATOR] {
        let segments = extract_with_separator(expected, first_original, response, separator, conventions);
        if let Some(segments) = segments {
            debug!("响应分段成功 (分隔符: {:?}, 段落数: {})", separator, expected);
            return Ok(segments);
        }
    }

    Err(ParseError {
        expected,
        actual: first_pass,
    })
}

fn extract_with_separator(
    expected: usize,
    first_original: Option<&str>,
    response: &str,
    separator: &str,
    conventions: &TextConventions,
) -> Option<Vec<String>> {
    let segments = split_trimmed(response, separator);
    let settle = |segments: Vec<String>| settle(segments, expected, first_original, conventions);

    if let Some(done) = settle(segments.clone()) {
        return Some(done);
    }

    // 模型把同一段落重复输出
    let mut deduped: Vec<String> = Vec::with_capacity(segments.len());
    for segment in &segments {
        if !deduped.contains(segment) {
            deduped.push(segment.clone());
        }
    }
    if deduped.len() != segments.len() {
        if let Some(done) = settle(deduped) {
            return Some(done);
        }
    }

    // 分隔符丢失时退回到空行、再退回到换行
    let joined = segments.join("\n\n");
    for fallback in ["\n\n", "\n"] {
        let resplit = split_trimmed(&joined, fallback);
        if let Some(done) = settle(resplit) {
            if looks_like_summary(&done[0]) {
                debug!("回退分段的首段像是修改说明，放弃");
                continue;
            }
            return Some(done);
        }
    }

    None
}

/// 多出一条开场白时去掉，数量正好时返回
fn settle(
    mut segments: Vec<String>,
    expected: usize,
    first_original: Option<&str>,
    conventions: &TextConventions,
) -> Option<Vec<String>> {
    if segments.len() == expected + 1
        && is_preamble(&segments[0], conventions)
        && !is_first_paragraph(&segments[0], first_original, conventions)
    {
        segments.remove(0);
    }
    (segments.len() == expected).then_some(segments)
}

/// 片段其实是以开场白式短语开头的首段原文
fn is_first_paragraph(segment: &str, first_original: Option<&str>, conventions: &TextConventions) -> bool {
    first_original.is_some_and(|original| {
        is_preamble(original, conventions) && relative_distance(original, segment) <= 0.5
    })
}

fn split_trimmed(text: &str, separator: &str) -> Vec<String> {
    text.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
