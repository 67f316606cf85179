//! 持久化接口
//!
//! 核心逻辑只依赖这三个 trait，具体存储（内存 / 数据库）由组合根注入。
//! 每个方法对单个键的修改必须是原子的。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::StorageResult;
use crate::models::{
    CacheEntry, CacheKey, DailyStat, EntryId, NewEntry, ReviewUpdate, StatDelta, VocabularyEntry,
};

/// 保存词条的结果
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub entry: VocabularyEntry,
    /// true 表示新插入，false 表示更新了已有词条
    pub inserted: bool,
}

/// 词条存储
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// 按指纹插入或更新词条
    ///
    /// 已存在同指纹的活跃词条时只更新内容字段，调度状态保持不变
    async fn save(&self, draft: NewEntry, now: DateTime<Utc>) -> StorageResult<SaveOutcome>;

    /// 按 ID 获取活跃词条（已软删除的视为不存在）
    async fn get_by_id(&self, id: EntryId) -> StorageResult<Option<VocabularyEntry>>;

    /// 原子地应用一次复习结果，词条不存在时返回 false
    async fn update_review(&self, id: EntryId, update: &ReviewUpdate) -> StorageResult<bool>;

    /// 软删除，词条不存在或已删除时返回 false
    async fn soft_delete(&self, id: EntryId, now: DateTime<Utc>) -> StorageResult<bool>;

    /// 到期的活跃词条，按 next_review_at 升序（从未安排的排在最前）
    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> StorageResult<Vec<VocabularyEntry>>;

    /// 所有活跃词条，按 ID 升序
    async fn list_active(&self) -> StorageResult<Vec<VocabularyEntry>>;

    /// 熟练度在 [min, max] 内的活跃词条
    async fn list_by_proficiency(&self, min: u8, max: u8) -> StorageResult<Vec<VocabularyEntry>>;

    async fn count_active(&self) -> StorageResult<usize>;
}

/// 翻译缓存存储
#[async_trait]
pub trait CacheRepository: Send + Sync {
    /// 读取原始条目（不修改命中次数，不检查过期）
    async fn get(&self, key: &CacheKey) -> StorageResult<Option<CacheEntry>>;

    /// 插入或合并条目：已存在时命中次数 +1 并替换内容，否则按传入条目插入
    async fn upsert(&self, entry: CacheEntry) -> StorageResult<CacheEntry>;

    /// 命中次数 +1，返回更新后的条目
    async fn touch(&self, key: &CacheKey) -> StorageResult<Option<CacheEntry>>;

    async fn delete(&self, key: &CacheKey) -> StorageResult<bool>;

    /// 删除所有过期条目，返回删除数量
    async fn delete_expired(&self, now: DateTime<Utc>) -> StorageResult<usize>;
}

/// 每日统计存储
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// 累加某天的统计，当天没有记录时先创建
    async fn increment(&self, date: NaiveDate, delta: &StatDelta) -> StorageResult<DailyStat>;

    async fn get(&self, date: NaiveDate) -> StorageResult<Option<DailyStat>>;

    /// [from, to] 闭区间内的统计，按日期升序，没有记录的日期不返回
    async fn range(&self, from: NaiveDate, to: NaiveDate) -> StorageResult<Vec<DailyStat>>;
}
