//! 每日统计

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 统计增量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDelta {
    pub new_words: u32,
    pub review_count: u32,
    pub review_correct: u32,
    /// 学习时长（分钟）
    pub study_duration: u32,
    pub translation_count: u32,
    pub ai_calls: u32,
    pub ai_tokens: u64,
}

impl StatDelta {
    pub fn is_empty(&self) -> bool {
        *self == StatDelta::default()
    }
}

/// 每日统计（一天一行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub new_words: u32,
    pub review_count: u32,
    pub review_correct: u32,
    pub study_duration: u32,
    pub translation_count: u32,
    pub ai_calls: u32,
    pub ai_tokens: u64,
}

impl DailyStat {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            new_words: 0,
            review_count: 0,
            review_correct: 0,
            study_duration: 0,
            translation_count: 0,
            ai_calls: 0,
            ai_tokens: 0,
        }
    }

    /// 累加增量
    pub fn apply(&mut self, delta: &StatDelta) {
        self.new_words = self.new_words.saturating_add(delta.new_words);
        self.review_count = self.review_count.saturating_add(delta.review_count);
        self.review_correct = self.review_correct.saturating_add(delta.review_correct);
        self.study_duration = self.study_duration.saturating_add(delta.study_duration);
        self.translation_count = self
            .translation_count
            .saturating_add(delta.translation_count);
        self.ai_calls = self.ai_calls.saturating_add(delta.ai_calls);
        self.ai_tokens = self.ai_tokens.saturating_add(delta.ai_tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_accumulates() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let mut stat = DailyStat::empty(date);
        stat.apply(&StatDelta {
            translation_count: 1,
            ai_calls: 1,
            ai_tokens: 120,
            ..Default::default()
        });
        stat.apply(&StatDelta {
            translation_count: 1,
            ..Default::default()
        });

        assert_eq!(stat.translation_count, 2);
        assert_eq!(stat.ai_calls, 1);
        assert_eq!(stat.ai_tokens, 120);
        assert!(StatDelta::default().is_empty());
    }
}
