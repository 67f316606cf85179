//! SM-2 复习算法
//!
//! 基于 SuperMemo SM-2 算法计算间隔重复的下次复习时间，
//! 并在此之上计算 0-100 的熟练度分数。
//!
//! 所有函数都是纯函数，`now` 由调用方传入。
//! 计算出错时返回安全的默认值，不会阻塞用户的学习流程。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::models::Difficulty;

/// 一次调度计算的结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewSchedule {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub next_review_at: DateTime<Utc>,
}

/// SM-2 间隔重复算法
pub struct Sm2Algorithm;

impl Sm2Algorithm {
    // 质量评分定义
    /// 完美回忆
    pub const QUALITY_PERFECT: i32 = 5;
    /// 正确但有些犹豫
    pub const QUALITY_CORRECT: i32 = 4;
    /// 正确但很困难
    pub const QUALITY_RECALLED: i32 = 3;
    /// 错误但感觉熟悉
    pub const QUALITY_WRONG: i32 = 2;
    /// 完全忘记
    pub const QUALITY_FORGOT: i32 = 1;
    /// 完全不记得
    pub const QUALITY_BLACKOUT: i32 = 0;

    // 初始值
    pub const INITIAL_EASE_FACTOR: f64 = 2.5;
    pub const INITIAL_INTERVAL: u32 = 1;
    pub const MIN_EASE_FACTOR: f64 = 1.3;

    /// 第二次成功复习的固定间隔
    const SECOND_INTERVAL: u32 = 6;

    /// 计算下次复习时间
    ///
    /// # 参数
    /// - `quality`: 质量评分 (0-5)，超出范围按 3 处理
    /// - `ease_factor`: 难度系数 (>=1.3)
    /// - `interval_days`: 当前间隔天数
    /// - `review_count`: 已复习次数
    /// - `now`: 计算时刻
    ///
    /// # 返回
    /// 新难度系数、新间隔天数、下次复习时间
    pub fn next_review(
        quality: i32,
        ease_factor: f64,
        interval_days: u32,
        review_count: u32,
        now: DateTime<Utc>,
    ) -> ReviewSchedule {
        match Self::try_next_review(quality, ease_factor, interval_days, review_count, now) {
            Some(schedule) => {
                debug!(
                    "SM-2计算: quality={}, ease_factor={:.2}->{:.2}, interval={}->{}, next_review={}",
                    quality,
                    ease_factor,
                    schedule.ease_factor,
                    interval_days,
                    schedule.interval_days,
                    schedule.next_review_at.format("%Y-%m-%d")
                );
                schedule
            }
            None => {
                error!(
                    "SM-2计算失败: quality={}, ease_factor={}, interval={}, review_count={}，使用默认值",
                    quality, ease_factor, interval_days, review_count
                );
                Self::initial_values(now)
            }
        }
    }

    fn try_next_review(
        quality: i32,
        ease_factor: f64,
        interval_days: u32,
        review_count: u32,
        now: DateTime<Utc>,
    ) -> Option<ReviewSchedule> {
        if !ease_factor.is_finite() {
            return None;
        }

        let quality = Self::normalize_quality(quality);

        // 1. 更新难度系数
        let new_ease_factor = Self::update_ease_factor(ease_factor, quality);

        // 2. 计算新间隔
        let new_interval = if quality < Self::QUALITY_RECALLED {
            // 回答错误，重新开始
            Self::INITIAL_INTERVAL
        } else if review_count == 0 {
            Self::INITIAL_INTERVAL
        } else if review_count == 1 {
            Self::SECOND_INTERVAL
        } else {
            let raw = (f64::from(interval_days) * new_ease_factor).floor();
            if !raw.is_finite() || raw > f64::from(u32::MAX) {
                return None;
            }
            // 间隔为 0 时下次复习仍需落在未来
            (raw as u32).max(Self::INITIAL_INTERVAL)
        };

        // 3. 计算下次复习时间
        let next_review_at = now.checked_add_signed(Duration::try_days(i64::from(new_interval))?)?;

        Some(ReviewSchedule {
            ease_factor: new_ease_factor,
            interval_days: new_interval,
            next_review_at,
        })
    }

    fn normalize_quality(quality: i32) -> i32 {
        if (Self::QUALITY_BLACKOUT..=Self::QUALITY_PERFECT).contains(&quality) {
            quality
        } else {
            warn!("无效的质量评分: {}，使用默认值3", quality);
            Self::QUALITY_RECALLED
        }
    }

    /// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))，不低于 1.3
    fn update_ease_factor(current_ef: f64, quality: i32) -> f64 {
        let q = f64::from(5 - quality);
        let new_ef = current_ef + (0.1 - q * (0.08 + q * 0.02));
        new_ef.max(Self::MIN_EASE_FACTOR)
    }

    /// 计算熟练度 (0-100)
    ///
    /// 综合考虑：
    /// - 正确率 (40%)
    /// - 复习次数 (30%)，对数曲线，避免次数过多时增长过快
    /// - 难度系数 (30%)，EF 1.3-2.5 映射到 0-30
    pub fn proficiency(review_count: u32, correct_count: u32, ease_factor: f64) -> u8 {
        if review_count == 0 {
            return 0;
        }

        let accuracy_score = f64::from(correct_count) / f64::from(review_count) * 40.0;

        let review_score = ((f64::from(review_count) + 1.0).ln() / 1.5f64.ln() * 10.0).min(30.0);

        let ef_normalized = (ease_factor - Self::MIN_EASE_FACTOR)
            / (Self::INITIAL_EASE_FACTOR - Self::MIN_EASE_FACTOR);
        let ef_score = (ef_normalized * 30.0).clamp(0.0, 30.0);

        let total = accuracy_score + review_score + ef_score;
        if !total.is_finite() {
            error!(
                "熟练度计算失败: review={}, correct={}, ef={}",
                review_count, correct_count, ease_factor
            );
            return 0;
        }

        let proficiency = total.floor().clamp(0.0, 100.0) as u8;

        debug!(
            "熟练度计算: review={}, correct={}, ef={:.2} -> proficiency={}",
            review_count, correct_count, ease_factor, proficiency
        );

        proficiency
    }

    /// 将用户输入转换为质量评分
    ///
    /// | 是否正确 | 难度 | 质量 |
    /// |---|---|---|
    /// | 正确 | easy | 5 |
    /// | 正确 | normal | 4 |
    /// | 正确 | hard | 3 |
    /// | 错误 | hard | 1 |
    /// | 错误 | normal / easy | 2 |
    pub fn quality_from_user_input(is_correct: bool, difficulty: Difficulty) -> i32 {
        match (is_correct, difficulty) {
            (true, Difficulty::Easy) => Self::QUALITY_PERFECT,
            (true, Difficulty::Normal) => Self::QUALITY_CORRECT,
            (true, Difficulty::Hard) => Self::QUALITY_RECALLED,
            (false, Difficulty::Hard) => Self::QUALITY_FORGOT,
            (false, Difficulty::Normal | Difficulty::Easy) => Self::QUALITY_WRONG,
        }
    }

    /// 从未复习过的词条使用的初始值
    pub fn initial_values(now: DateTime<Utc>) -> ReviewSchedule {
        ReviewSchedule {
            ease_factor: Self::INITIAL_EASE_FACTOR,
            interval_days: Self::INITIAL_INTERVAL,
            next_review_at: now + Duration::days(i64::from(Self::INITIAL_INTERVAL)),
        }
    }
}
