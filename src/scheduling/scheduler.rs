//! 复习计划调度器
//!
//! 在 SM-2 之上提供到期判断、紧急程度分类和记忆保持率估算

use chrono::{DateTime, Local, Utc};
use tracing::error;

use crate::models::UrgencyLevel;

/// “即将到期”的天数上限
const SOON_DAYS: i64 = 3;

/// 复习计划调度器
pub struct ReviewScheduler;

impl ReviewScheduler {
    /// 判断是否到了复习时间（从未安排过的视为到期）
    pub fn is_due(next_review_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match next_review_at {
            None => true,
            Some(next) => now >= next,
        }
    }

    /// 获取紧急程度
    ///
    /// 按本地日历日计算差值，而不是小数天数
    pub fn urgency_level(next_review_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> UrgencyLevel {
        let Some(next) = next_review_at else {
            return UrgencyLevel::Overdue;
        };

        let days_until = Self::calendar_days_between(now, next);

        if days_until < 0 {
            UrgencyLevel::Overdue
        } else if days_until == 0 {
            UrgencyLevel::Today
        } else if days_until <= SOON_DAYS {
            UrgencyLevel::Soon
        } else {
            UrgencyLevel::Future
        }
    }

    fn calendar_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
        let from = from.with_timezone(&Local).date_naive();
        let to = to.with_timezone(&Local).date_naive();
        (to - from).num_days()
    }

    /// 估算当前记忆保持率
    ///
    /// 遗忘曲线 R(t) = e^(-t/S)，其中 S = interval * ease_factor（记忆强度）。
    /// 从未复习返回 0；计算异常返回 0.5。
    pub fn retention_rate(
        last_review_at: Option<DateTime<Utc>>,
        ease_factor: f64,
        interval_days: u32,
        now: DateTime<Utc>,
    ) -> f64 {
        let Some(last) = last_review_at else {
            return 0.0;
        };

        let days_elapsed = (now - last).num_days() as f64;
        let memory_strength = f64::from(interval_days) * ease_factor;

        if memory_strength <= 0.0 {
            return 0.0;
        }

        let retention = (-days_elapsed / memory_strength).exp();
        if !retention.is_finite() {
            error!(
                "保持率计算失败: days_elapsed={}, strength={}",
                days_elapsed, memory_strength
            );
            return 0.5;
        }

        retention.clamp(0.0, 1.0)
    }
}
