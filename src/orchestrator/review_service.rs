//! 复习服务 - 编排层
//!
//! 把 SM-2 算法和调度器应用到已保存的词条上：
//! 查询到期词条、提交复习结果、重置进度、统计学习情况。
//!
//! 读操作遇到存储错误时记录日志并返回空结果，写操作返回 `false`。

use chrono::{Days, Local, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::AppResult;
use crate::infrastructure::{EntryRepository, StatsRepository};
use crate::models::{
    BatchReviewSummary, DailyStat, Difficulty, EntryId, ReviewOutcome, ReviewStatistics,
    ReviewSubmission, ReviewUpdate, StatDelta, UrgencyBuckets, UrgencyLevel, VocabularyEntry,
};
use crate::scheduling::{ReviewScheduler, Sm2Algorithm};

/// 熟练度 >= 该值视为已掌握
pub const MASTERED_THRESHOLD: u8 = 80;

/// 熟练度 < 该值视为薄弱 / 新词
pub const WEAK_THRESHOLD: u8 = 40;

/// 每个词条的平均复习耗时（秒）
const SECONDS_PER_ENTRY: u32 = 30;

/// 复习服务
#[derive(Clone)]
pub struct ReviewService {
    entries: Arc<dyn EntryRepository>,
    stats: Arc<dyn StatsRepository>,
}

impl ReviewService {
    pub fn new(entries: Arc<dyn EntryRepository>, stats: Arc<dyn StatsRepository>) -> Self {
        Self { entries, stats }
    }

    /// 获取待复习词条，按下次复习时间升序
    pub async fn get_due_reviews(&self, limit: Option<usize>) -> Vec<VocabularyEntry> {
        match self.entries.list_due(Utc::now(), limit).await {
            Ok(entries) => entries,
            Err(e) => {
                error!("获取待复习词条失败: {}", e);
                Vec::new()
            }
        }
    }

    /// 按紧急程度分组（逾期 / 今天 / 即将到期），组内按下次复习时间升序
    pub async fn get_reviews_by_urgency(&self) -> UrgencyBuckets {
        let entries = match self.entries.list_active().await {
            Ok(entries) => entries,
            Err(e) => {
                error!("按紧急程度获取词条失败: {}", e);
                return UrgencyBuckets::default();
            }
        };

        let now = Utc::now();
        let mut buckets = UrgencyBuckets::default();
        for entry in entries {
            match ReviewScheduler::urgency_level(entry.review.next_review_at, now) {
                UrgencyLevel::Overdue => buckets.overdue.push(entry),
                UrgencyLevel::Today => buckets.today.push(entry),
                UrgencyLevel::Soon => buckets.soon.push(entry),
                UrgencyLevel::Future => {}
            }
        }

        for bucket in [&mut buckets.overdue, &mut buckets.today, &mut buckets.soon] {
            bucket.sort_by(|a, b| {
                a.review
                    .next_review_at
                    .cmp(&b.review.next_review_at)
                    .then(a.id.cmp(&b.id))
            });
        }
        buckets
    }

    /// 提交复习结果
    ///
    /// # 参数
    /// - `entry_id`: 词条 ID
    /// - `is_correct`: 是否答对
    /// - `difficulty`: 主观难度
    ///
    /// # 返回
    /// 词条不存在或写入失败时返回 false
    pub async fn submit_review(&self, entry_id: EntryId, is_correct: bool, difficulty: Difficulty) -> bool {
        let entry = match self.entries.get_by_id(entry_id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                warn!("⚠️ 词条不存在: #{}", entry_id);
                return false;
            }
            Err(e) => {
                error!("读取词条 #{} 失败: {}", entry_id, e);
                return false;
            }
        };

        let now = Utc::now();
        let state = &entry.review;
        let (ease_factor, interval_days) = if state.is_new() {
            let initial = Sm2Algorithm::initial_values(now);
            (initial.ease_factor, initial.interval_days)
        } else {
            (state.ease_factor, state.interval_days)
        };

        let quality = Sm2Algorithm::quality_from_user_input(is_correct, difficulty);
        let schedule =
            Sm2Algorithm::next_review(quality, ease_factor, interval_days, state.review_count, now);

        let review_count = state.review_count.saturating_add(1);
        let correct_count = state.correct_count.saturating_add(u32::from(is_correct));
        let proficiency = Sm2Algorithm::proficiency(review_count, correct_count, schedule.ease_factor);

        let update = ReviewUpdate {
            ease_factor: schedule.ease_factor,
            interval_days: schedule.interval_days,
            next_review_at: schedule.next_review_at,
            proficiency,
            reviewed_at: now,
            outcome: ReviewOutcome::Answered {
                correct: is_correct,
            },
        };

        match self.entries.update_review(entry_id, &update).await {
            Ok(true) => {
                info!(
                    "📚 复习 #{}: quality={} → EF={:.2}, interval={}天, proficiency={}",
                    entry_id, quality, schedule.ease_factor, schedule.interval_days, proficiency
                );
                self.bump_stats(StatDelta {
                    review_count: 1,
                    review_correct: u32::from(is_correct),
                    ..Default::default()
                })
                .await;
                true
            }
            Ok(false) => {
                warn!("⚠️ 词条 #{} 已被删除，复习结果未保存", entry_id);
                false
            }
            Err(e) => {
                error!("保存复习结果失败 #{}: {}", entry_id, e);
                false
            }
        }
    }

    /// 重置复习进度
    ///
    /// 调度参数恢复初始值、熟练度归零；复习次数与答对次数保留
    pub async fn reset_progress(&self, entry_id: EntryId) -> bool {
        let now = Utc::now();
        let initial = Sm2Algorithm::initial_values(now);
        let update = ReviewUpdate {
            ease_factor: initial.ease_factor,
            interval_days: initial.interval_days,
            next_review_at: initial.next_review_at,
            proficiency: 0,
            reviewed_at: now,
            outcome: ReviewOutcome::Reset,
        };

        match self.entries.update_review(entry_id, &update).await {
            Ok(true) => {
                info!("🔄 已重置复习进度: #{}", entry_id);
                true
            }
            Ok(false) => {
                warn!("⚠️ 词条不存在: #{}", entry_id);
                false
            }
            Err(e) => {
                error!("重置复习进度失败 #{}: {}", entry_id, e);
                false
            }
        }
    }

    /// 批量提交复习结果，单条失败不影响其他条目
    pub async fn batch_review(&self, items: &[ReviewSubmission]) -> BatchReviewSummary {
        let mut summary = BatchReviewSummary::default();
        for item in items {
            if self
                .submit_review(item.entry_id, item.is_correct, item.difficulty)
                .await
            {
                summary.success_count += 1;
            } else {
                summary.failed_count += 1;
            }
        }

        info!(
            "📦 批量复习完成: 成功 {}, 失败 {}",
            summary.success_count, summary.failed_count
        );
        summary
    }

    /// 复习统计
    pub async fn get_review_statistics(&self) -> ReviewStatistics {
        let entries = match self.entries.list_active().await {
            Ok(entries) => entries,
            Err(e) => {
                error!("获取复习统计失败: {}", e);
                return ReviewStatistics::default();
            }
        };

        let now = Utc::now();
        let today = Local::now().date_naive();
        let mut stats = ReviewStatistics {
            total_count: entries.len(),
            ..Default::default()
        };

        for entry in &entries {
            let review = &entry.review;
            if ReviewScheduler::is_due(review.next_review_at, now) {
                stats.due_count += 1;
            }
            match review.proficiency {
                p if p >= MASTERED_THRESHOLD => stats.mastered_count += 1,
                p if p >= WEAK_THRESHOLD => stats.learning_count += 1,
                _ => stats.new_count += 1,
            }
            let reviewed_today = review
                .last_review_at
                .is_some_and(|t| t.with_timezone(&Local).date_naive() == today);
            if reviewed_today {
                stats.reviewed_today += 1;
            }
        }

        stats
    }

    /// 已掌握的词条（熟练度 >= threshold）
    pub async fn get_mastered_entries(&self, threshold: u8) -> Vec<VocabularyEntry> {
        match self.entries.list_by_proficiency(threshold, 100).await {
            Ok(entries) => entries,
            Err(e) => {
                error!("获取已掌握词条失败: {}", e);
                Vec::new()
            }
        }
    }

    /// 薄弱词条（熟练度 < threshold），按熟练度升序
    pub async fn get_weak_entries(&self, threshold: u8) -> Vec<VocabularyEntry> {
        let Some(max) = threshold.checked_sub(1) else {
            return Vec::new();
        };

        match self.entries.list_by_proficiency(0, max).await {
            Ok(mut entries) => {
                entries.sort_by_key(|e| e.review.proficiency);
                entries
            }
            Err(e) => {
                error!("获取薄弱词条失败: {}", e);
                Vec::new()
            }
        }
    }

    /// 估算复习耗时（分钟），每个词条约 30 秒，至少 1 分钟
    pub fn estimate_study_time(entry_count: usize) -> u32 {
        let count = u32::try_from(entry_count).unwrap_or(u32::MAX);
        (count.saturating_mul(SECONDS_PER_ENTRY) / 60).max(1)
    }

    /// 词条当前的记忆保持率
    pub fn retention_rate(entry: &VocabularyEntry) -> f64 {
        ReviewScheduler::retention_rate(
            entry.review.last_review_at,
            entry.review.ease_factor,
            entry.review.interval_days,
            Utc::now(),
        )
    }

    /// 词条的紧急程度
    pub fn urgency_level(entry: &VocabularyEntry) -> UrgencyLevel {
        ReviewScheduler::urgency_level(entry.review.next_review_at, Utc::now())
    }

    /// 删除词条（软删除）
    pub async fn delete_entry(&self, entry_id: EntryId) -> bool {
        match self.entries.soft_delete(entry_id, Utc::now()).await {
            Ok(deleted) => {
                if deleted {
                    info!("🗑️ 已删除词条 #{}", entry_id);
                }
                deleted
            }
            Err(e) => {
                error!("删除词条 #{} 失败: {}", entry_id, e);
                false
            }
        }
    }

    /// 最近 `days` 天（含今天）的每日统计
    pub async fn recent_stats(&self, days: u32) -> AppResult<Vec<DailyStat>> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let today = Local::now().date_naive();
        let from = today
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .unwrap_or(NaiveDate::MIN);
        Ok(self.stats.range(from, today).await?)
    }

    async fn bump_stats(&self, delta: StatDelta) {
        let today = Local::now().date_naive();
        match self.stats.increment(today, &delta).await {
            Ok(_) => debug!("统计已更新: {:?}", delta),
            Err(e) => warn!("⚠️ 更新统计失败: {}", e),
        }
    }
}
