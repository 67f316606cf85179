//! 复习相关的数据类型

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

use super::entry::{EntryId, VocabularyEntry};

/// 用户主观难度感受
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("未知的难度: {}", other)),
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 紧急程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    /// 逾期
    Overdue,
    /// 今天
    Today,
    /// 即将（3天内）
    Soon,
    /// 未来
    Future,
}

impl UrgencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Overdue => "overdue",
            UrgencyLevel::Today => "today",
            UrgencyLevel::Soon => "soon",
            UrgencyLevel::Future => "future",
        }
    }
}

impl Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单条复习提交
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub entry_id: EntryId,
    pub is_correct: bool,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl ReviewSubmission {
    pub fn new(entry_id: EntryId, is_correct: bool, difficulty: Difficulty) -> Self {
        Self {
            entry_id,
            is_correct,
            difficulty,
        }
    }
}

/// 批量复习结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReviewSummary {
    pub success_count: usize,
    pub failed_count: usize,
}

/// 按紧急程度分组的待复习词条
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrgencyBuckets {
    pub overdue: Vec<VocabularyEntry>,
    pub today: Vec<VocabularyEntry>,
    pub soon: Vec<VocabularyEntry>,
}

impl UrgencyBuckets {
    pub fn total(&self) -> usize {
        self.overdue.len() + self.today.len() + self.soon.len()
    }
}

/// 复习统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStatistics {
    pub total_count: usize,
    pub due_count: usize,
    /// 熟练度 >= 80
    pub mastered_count: usize,
    /// 熟练度 40-79
    pub learning_count: usize,
    /// 熟练度 < 40
    pub new_count: usize,
    pub reviewed_today: usize,
}
