//! 编辑距离校验
//!
//! 相对编辑距离 = 字符级 Levenshtein 距离 / 原文字符数，
//! 用来识别模型"改写"而不是"修正"的情况。

use tracing::debug;

/// 单条修正的相对编辑距离
///
/// 原文为空时：修正也为空记为 0，否则记为无穷大
pub fn relative_distance(original: &str, candidate: &str) -> f64 {
    let len = original.chars().count();
    if len == 0 {
        return if candidate.is_empty() { 0.0 } else { f64::INFINITY };
    }
    strsim::levenshtein(original, candidate) as f64 / len as f64
}

/// 整批修正是否通过相似度校验
///
/// 默认比较平均相对距离；`all_must_pass` 为 true 时任意一条超过阈值即失败。
/// 原文为空而修正不同的组合直接失败。
pub fn validate_corrections(
    originals: &[&str],
    candidates: &[String],
    threshold: f64,
    all_must_pass: bool,
) -> bool {
    if originals.len() != candidates.len() {
        return false;
    }
    if originals.is_empty() {
        return true;
    }

    let distances: Vec<f64> = originals
        .iter()
        .zip(candidates)
        .map(|(original, candidate)| relative_distance(original, candidate))
        .collect();

    if distances.iter().any(|d| d.is_infinite()) {
        return false;
    }

    if all_must_pass {
        distances.iter().all(|d| *d <= threshold)
    } else {
        let average = distances.iter().sum::<f64>() / distances.len() as f64;
        average <= threshold
    }
}

/// 带配置的相似度校验器
#[derive(Debug, Clone, Copy)]
pub struct SimilarityValidator {
    pub threshold: f64,
    pub all_must_pass: bool,
    /// 段落数少于该值的组不做校验
    pub min_group_size: usize,
}

impl SimilarityValidator {
    pub fn applies_to(&self, group_len: usize) -> bool {
        group_len >= self.min_group_size
    }

    pub fn validate(&self, originals: &[&str], candidates: &[String]) -> bool {
        let ok = validate_corrections(originals, candidates, self.threshold, self.all_must_pass);
        if !ok {
            debug!(
                "相似度校验未通过 (阈值: {}, 段落数: {})",
                self.threshold,
                originals.len()
            );
        }
        ok
    }
}
