//! 文本规范化 - 业务能力层
//!
//! 修正模型返回文本与原文之间的标点/引号风格漂移，只处理单个段落

use regex::Regex;

use crate::config::TextConventions;
use crate::error::ValidationError;
use crate::services::phrases::{is_no_change_phrase, is_preamble};
use crate::utils::logging::truncate_text;

const LEFT_DOUBLE: char = '“';
const RIGHT_DOUBLE: char = '”';
const LEFT_SINGLE: char = '‘';
const RIGHT_SINGLE: char = '’';

/// 引号内侧多余空格的模式
const SPACED_QUOTE_PATTERNS: [&str; 3] = [r"“[ \t]+", r"[ \t]+”", r"‘[ \t]+"];

/// 去掉推理模型输出的 `<think>…</think>` 块
pub fn strip_reasoning(response: &str) -> String {
    match Regex::new(r"(?s)<think>.*?</think>") {
        Ok(re) => re.replace_all(response, "").trim().to_string(),
        Err(_) => response.trim().to_string(),
    }
}

/// 对一条被接受的修正做后处理
///
/// 依次：无需修改短语 → 去掉前导破折号 → 折叠重复分隔符 → 统一引号风格
/// → 清理重复引号和多余空格 → 英式标点判定 → 检查是否仍是说明文字
pub fn post_process(
    original: &str,
    candidate: &str,
    conventions: &TextConventions,
) -> Result<String, ValidationError> {
    let trimmed = candidate.trim();

    if is_no_change_phrase(trimmed, conventions) {
        return Ok(original.to_string());
    }

    let mut text = strip_leading_artifacts(original, trimmed).to_string();

    if text.contains("---") {
        text = text
            .split("---")
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string();
    }

    if conventions.unify_quotes {
        text = unify_quotes(original, &text);
        text = collapse_quote_artifacts(original, &text);
    }

    if conventions.british_punctuation && QuoteStyle::detect(original).single_dialogue {
        text = resolve_british_punctuation(&text);
    }

    // 原文本身就以这类短语开头时不算说明文字
    if text != original && is_preamble(&text, conventions) && !is_preamble(original, conventions) {
        return Err(ValidationError::Commentary {
            preview: truncate_text(&text, 60),
        });
    }

    Ok(text)
}

/// 去掉模型在段落开头留下的 `-\n` / `—` 残留
fn strip_leading_artifacts<'a>(original: &str, candidate: &'a str) -> &'a str {
    let original_dash = original.trim_start().starts_with('—');
    let original_hyphen = original.trim_start().starts_with('-');
    let mut text = candidate;

    loop {
        if let Some(rest) = text.strip_prefix("-\n").or_else(|| text.strip_prefix("—\n")) {
            text = rest.trim_start();
        } else if !original_dash && text.starts_with('—') {
            text = text.trim_start_matches('—').trim_start();
        } else if !original_hyphen && (text.starts_with("- ") || text.starts_with("-\t")) {
            text = text[1..].trim_start();
        } else {
            break;
        }
    }
    text
}

/// 原文使用的引号风格
#[derive(Debug, Clone, Copy, Default)]
struct QuoteStyle {
    curly_single: bool,
    straight_single: bool,
    curly_double: bool,
    straight_double: bool,
    /// 用单弯引号标对话（英式）
    single_dialogue: bool,
}

impl QuoteStyle {
    fn detect(original: &str) -> Self {
        let curly_double = original.contains([LEFT_DOUBLE, RIGHT_DOUBLE]);
        Self {
            curly_single: original.contains([LEFT_SINGLE, RIGHT_SINGLE]),
            straight_single: original.contains('\''),
            curly_double,
            straight_double: original.contains('"'),
            single_dialogue: original.contains(LEFT_SINGLE) && !curly_double,
        }
    }
}

/// 按原文风格转换修正文本中的撇号与引号
fn unify_quotes(original: &str, candidate: &str) -> String {
    let style = QuoteStyle::detect(original);
    let mut text = candidate.to_string();

    if style.curly_single && !style.straight_single {
        text = curl_single_quotes(&text);
    } else if style.straight_single && !style.curly_single {
        text = text.replace([LEFT_SINGLE, RIGHT_SINGLE], "'");
    }

    if style.curly_double && !style.straight_double {
        text = curl_double_quotes(&text);
    } else if style.straight_double && !style.curly_double {
        text = text.replace([LEFT_DOUBLE, RIGHT_DOUBLE], "\"");
    }

    if style.single_dialogue && !style.straight_double {
        text = curl_double_quotes(&text)
            .replace(LEFT_DOUBLE, &LEFT_SINGLE.to_string())
            .replace(RIGHT_DOUBLE, &RIGHT_SINGLE.to_string());
    }

    text
}

/// 直单引号转弯引号：词首为左引号，其余为右引号/撇号
fn curl_single_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if c == '\'' {
            let opening = prev.map_or(true, |p| {
                p.is_whitespace() || matches!(p, '(' | '[' | '—' | LEFT_DOUBLE | '"')
            });
            out.push(if opening { LEFT_SINGLE } else { RIGHT_SINGLE });
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// 直双引号转成成对的弯引号（开/闭状态切换）
fn curl_double_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut open_next = true;
    for c in text.chars() {
        match c {
            '"' => {
                out.push(if open_next { LEFT_DOUBLE } else { RIGHT_DOUBLE });
                open_next = !open_next;
            }
            LEFT_DOUBLE => {
                out.push(c);
                open_next = false;
            }
            RIGHT_DOUBLE => {
                out.push(c);
                open_next = true;
            }
            _ => out.push(c),
        }
    }
    out
}

/// 折叠重复的弯引号、去掉引号内侧的空格（原文本身如此时保留）
fn collapse_quote_artifacts(original: &str, candidate: &str) -> String {
    let mut text = candidate.to_string();

    for pair in ["““", "””", "‘‘", "’’"] {
        if original.contains(pair) {
            continue;
        }
        let single = &pair[..pair.len() / 2];
        while text.contains(pair) {
            text = text.replace(pair, single);
        }
    }

    for pattern in SPACED_QUOTE_PATTERNS {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        if !re.is_match(original) {
            text = re
                .replace_all(&text, |caps: &regex::Captures| caps[0].trim().to_string())
                .into_owned();
        }
    }

    text
}

/// 英式引号中 `,’.` / `.’,` 这类标点重复的判定
///
/// 后面第一个非空白字符是大写（或已到结尾）视为句末，去掉逗号；否则保留逗号。
fn resolve_british_punctuation(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let is_mark = |c: char| c == ',' || c == '.';
    let is_close = |c: char| c == RIGHT_SINGLE || c == RIGHT_DOUBLE;

    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if i + 2 < chars.len()
            && is_mark(chars[i])
            && is_close(chars[i + 1])
            && is_mark(chars[i + 2])
            && chars[i] != chars[i + 2]
        {
            let next = chars[i + 3..].iter().find(|c| !c.is_whitespace());
            let sentence_end = next.map_or(true, |c| c.is_uppercase());
            let keep = if sentence_end { '.' } else { ',' };

            if chars[i] == keep {
                out.push(chars[i]);
                out.push(chars[i + 1]);
            } else {
                out.push(chars[i + 1]);
                out.push(chars[i + 2]);
            }
            i += 3;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}
