//! 重跑历史
//!
//! 固定容量的二维表：每一行是一次被接受的重跑结果，每一列对应组内一个段落。
//! 容量为重跑次数 + 1，整个修正周期内只分配一次。

/// 一个段落组的修正历史
#[derive(Debug, Clone)]
pub struct CorrectionHistory {
    slots: usize,
    capacity: usize,
    entries: Vec<String>,
}

impl CorrectionHistory {
    pub fn with_capacity(capacity: usize, slots: usize) -> Self {
        Self {
            slots,
            capacity,
            entries: Vec::with_capacity(capacity * slots),
        }
    }

    /// 已记录的行数
    pub fn len(&self) -> usize {
        if self.slots == 0 {
            0
        } else {
            self.entries.len() / self.slots
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// 追加一行；已满或列数不符时返回 false
    pub fn push(&mut self, corrections: &[String]) -> bool {
        if corrections.len() != self.slots || self.slots == 0 || self.is_full() {
            return false;
        }
        self.entries.extend_from_slice(corrections);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entry(&self, row: usize) -> Option<&[String]> {
        if row >= self.len() {
            return None;
        }
        Some(&self.entries[row * self.slots..(row + 1) * self.slots])
    }

    pub fn latest(&self) -> Option<&[String]> {
        self.len().checked_sub(1).and_then(|row| self.entry(row))
    }

    /// 最近两行逐列相同（模型已收敛）
    pub fn converged(&self) -> bool {
        let len = self.len();
        len >= 2 && self.entry(len - 1) == self.entry(len - 2)
    }

    /// 逐列多数投票
    ///
    /// 没有历史时返回 `fallback`；票数相同时取最先出现的那个。
    pub fn pick_best(&self, fallback: &[String]) -> Vec<String> {
        let rows = self.len();
        if rows == 0 {
            return fallback.to_vec();
        }

        (0..self.slots)
            .map(|slot| {
                let column: Vec<&String> = (0..rows)
                    .map(|row| &self.entries[row * self.slots + slot])
                    .collect();

                let mut best = column[0];
                let mut best_count = 0;
                for (i, candidate) in column.iter().enumerate() {
                    // 只在第一次出现时计数，保证平票取最早出现者
                    if column[..i].contains(candidate) {
                        continue;
                    }
                    let count = column.iter().filter(|c| *c == candidate).count();
                    if count > best_count {
                        best = candidate;
                        best_count = count;
                    }
                }
                best.clone()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pick_best_takes_majority_per_slot() {
        let mut history = CorrectionHistory::with_capacity(3, 2);
        history.push(&row(&["A", "B"]));
        history.push(&row(&["A", "C"]));
        history.push(&row(&["A", "C"]));

        assert_eq!(history.pick_best(&row(&["A", "B"])), row(&["A", "C"]));
    }

    #[test]
    fn test_pick_best_tie_prefers_first_seen() {
        let mut history = CorrectionHistory::with_capacity(2, 1);
        history.push(&row(&["X"]));
        history.push(&row(&["Y"]));
        assert_eq!(history.pick_best(&row(&["Z"])), row(&["X"]));
    }

    #[test]
    fn test_empty_history_uses_fallback() {
        let history = CorrectionHistory::with_capacity(2, 2);
        assert_eq!(history.pick_best(&row(&["A", "B"])), row(&["A", "B"]));
        assert!(history.latest().is_none());
    }

    #[test]
    fn test_converged_compares_last_two_rows() {
        let mut history = CorrectionHistory::with_capacity(3, 2);
        history.push(&row(&["A", "B"]));
        assert!(!history.converged());
        history.push(&row(&["A", "C"]));
        assert!(!history.converged());
        history.push(&row(&["A", "C"]));
        assert!(history.converged());
    }

    #[test]
    fn test_capacity_and_width_are_enforced() {
        let mut history = CorrectionHistory::with_capacity(1, 2);
        assert!(!history.push(&row(&["only one"])));
        assert!(history.push(&row(&["A", "B"])));
        assert!(!history.push(&row(&["C", "D"])));
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest(), Some(row(&["A", "B"]).as_slice()));
    }
}
