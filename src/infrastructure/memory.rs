//! 内存存储
//!
//! 基于 `DashMap` 实现三个存储接口，单键修改在分片锁内完成。
//! 进程退出即丢失，适合测试与命令行单次运行。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

use super::repository::{CacheRepository, EntryRepository, SaveOutcome, StatsRepository};
use crate::error::{StorageError, StorageResult};
use crate::models::{
    CacheEntry, CacheKey, DailyStat, EntryFingerprint, EntryId, NewEntry, ReviewUpdate,
    StatDelta, VocabularyEntry,
};

/// 内存存储
#[derive(Debug)]
pub struct MemoryStore {
    entries: DashMap<EntryId, VocabularyEntry>,
    /// 指纹 → 活跃词条 ID
    fingerprints: DashMap<EntryFingerprint, EntryId>,
    next_id: AtomicU64,
    cache: DashMap<CacheKey, CacheEntry>,
    stats: DashMap<NaiveDate, DailyStat>,
    /// 模拟存储故障
    unavailable: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            fingerprints: DashMap::new(),
            next_id: AtomicU64::new(1),
            cache: DashMap::new(),
            stats: DashMap::new(),
            unavailable: AtomicBool::new(false),
        }
    }

    /// 切换故障模式，开启后所有操作返回 `StorageError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("内存存储处于故障模式".to_string()))
        } else {
            Ok(())
        }
    }

    fn active_entries(&self) -> impl Iterator<Item = VocabularyEntry> + '_ {
        self.entries
            .iter()
            .filter(|e| e.is_active())
            .map(|e| e.value().clone())
    }

    /// 已缓存的条目数（含未清理的过期条目）
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl EntryRepository for MemoryStore {
    async fn save(&self, draft: NewEntry, now: DateTime<Utc>) -> StorageResult<SaveOutcome> {
        self.check_available()?;

        // 持有指纹分片锁，保证同一指纹的保存串行执行
        match self.fingerprints.entry(draft.fingerprint().clone()) {
            Entry::Occupied(mut slot) => {
                let id = *slot.get();
                if let Some(mut existing) = self.entries.get_mut(&id) {
                    if existing.is_active() {
                        existing.update_content(&draft, now);
                        debug!("更新已有词条 #{}", id);
                        return Ok(SaveOutcome {
                            entry: existing.clone(),
                            inserted: false,
                        });
                    }
                }

                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                let entry = VocabularyEntry::from_new(id, draft, now);
                self.entries.insert(id, entry.clone());
                slot.insert(id);
                debug!("插入新词条 #{}（替换已删除的同指纹词条）", id);
                Ok(SaveOutcome {
                    entry,
                    inserted: true,
                })
            }
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                let entry = VocabularyEntry::from_new(id, draft, now);
                self.entries.insert(id, entry.clone());
                slot.insert(id);
                debug!("插入新词条 #{}", id);
                Ok(SaveOutcome {
                    entry,
                    inserted: true,
                })
            }
        }
    }

    async fn get_by_id(&self, id: EntryId) -> StorageResult<Option<VocabularyEntry>> {
        self.check_available()?;
        Ok(self
            .entries
            .get(&id)
            .filter(|e| e.is_active())
            .map(|e| e.value().clone()))
    }

    async fn update_review(&self, id: EntryId, update: &ReviewUpdate) -> StorageResult<bool> {
        self.check_available()?;
        match self.entries.get_mut(&id) {
            Some(mut entry) if entry.is_active() => {
                entry.apply_review(update);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn soft_delete(&self, id: EntryId, now: DateTime<Utc>) -> StorageResult<bool> {
        self.check_available()?;

        let fingerprint = {
            let Some(mut entry) = self.entries.get_mut(&id) else {
                return Ok(false);
            };
            if !entry.is_active() {
                return Ok(false);
            }
            entry.mark_deleted(now);
            entry.fingerprint.clone()
        };

        // 词条锁已释放，再清理指纹索引
        self.fingerprints.remove_if(&fingerprint, |_, indexed| *indexed == id);
        Ok(true)
    }

    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> StorageResult<Vec<VocabularyEntry>> {
        self.check_available()?;
        let mut due: Vec<VocabularyEntry> = self
            .active_entries()
            .filter(|e| e.review.next_review_at.map_or(true, |next| next <= now))
            .collect();

        due.sort_by(|a, b| {
            a.review
                .next_review_at
                .cmp(&b.review.next_review_at)
                .then(a.id.cmp(&b.id))
        });

        if let Some(limit) = limit {
            due.truncate(limit);
        }
        Ok(due)
    }

    async fn list_active(&self) -> StorageResult<Vec<VocabularyEntry>> {
        self.check_available()?;
        let mut entries: Vec<VocabularyEntry> = self.active_entries().collect();
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }

    async fn list_by_proficiency(&self, min: u8, max: u8) -> StorageResult<Vec<VocabularyEntry>> {
        self.check_available()?;
        let mut entries: Vec<VocabularyEntry> = self
            .active_entries()
            .filter(|e| (min..=max).contains(&e.review.proficiency))
            .collect();
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }

    async fn count_active(&self) -> StorageResult<usize> {
        self.check_available()?;
        Ok(self.entries.iter().filter(|e| e.is_active()).count())
    }
}

#[async_trait]
impl CacheRepository for MemoryStore {
    async fn get(&self, key: &CacheKey) -> StorageResult<Option<CacheEntry>> {
        self.check_available()?;
        Ok(self.cache.get(key).map(|e| e.value().clone()))
    }

    async fn upsert(&self, entry: CacheEntry) -> StorageResult<CacheEntry> {
        self.check_available()?;
        let stored = match self.cache.entry(entry.key.clone()) {
            Entry::Occupied(mut slot) => {
                let merged = slot.get().refreshed(&entry);
                slot.insert(merged.clone());
                merged
            }
            Entry::Vacant(slot) => slot.insert(entry).value().clone(),
        };
        Ok(stored)
    }

    async fn touch(&self, key: &CacheKey) -> StorageResult<Option<CacheEntry>> {
        self.check_available()?;
        Ok(self.cache.get_mut(key).map(|mut e| {
            e.record_hit();
            e.value().clone()
        }))
    }

    async fn delete(&self, key: &CacheKey) -> StorageResult<bool> {
        self.check_available()?;
        Ok(self.cache.remove(key).is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        self.check_available()?;
        let before = self.cache.len();
        self.cache.retain(|_, e| !e.is_expired(now));
        Ok(before.saturating_sub(self.cache.len()))
    }
}

#[async_trait]
impl StatsRepository for MemoryStore {
    async fn increment(&self, date: NaiveDate, delta: &StatDelta) -> StorageResult<DailyStat> {
        self.check_available()?;
        let mut stat = self
            .stats
            .entry(date)
            .or_insert_with(|| DailyStat::empty(date));
        stat.apply(delta);
        Ok(stat.clone())
    }

    async fn get(&self, date: NaiveDate) -> StorageResult<Option<DailyStat>> {
        self.check_available()?;
        Ok(self.stats.get(&date).map(|s| s.value().clone()))
    }

    async fn range(&self, from: NaiveDate, to: NaiveDate) -> StorageResult<Vec<DailyStat>> {
        self.check_available()?;
        let mut stats: Vec<DailyStat> = self
            .stats
            .iter()
            .filter(|s| (from..=to).contains(s.key()))
            .map(|s| s.value().clone())
            .collect();
        stats.sort_by_key(|s| s.date);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryType, ReviewOutcome, TranslatorType};
    use chrono::Duration;

    fn draft(text: &str, translation: &str) -> NewEntry {
        NewEntry::new(text, translation, "en", "zh", EntryType::Word)
    }

    #[tokio::test]
    async fn test_save_inserts_then_updates() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let first = store.save(draft("hello", "你好"), now).await.unwrap();
        assert!(first.inserted);

        let second = store.save(draft(" hello ", "哈喽"), now).await.unwrap();
        assert!(!second.inserted);
        assert_eq!(second.entry.id, first.entry.id);
        assert_eq!(second.entry.translation, "哈喽");
        assert_eq!(store.count_active().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_same_text_other_language_pair_is_distinct() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let a = store.save(draft("hello", "你好"), now).await.unwrap();
        let b = store
            .save(NewEntry::new("hello", "こんにちは", "en", "ja", EntryType::Word), now)
            .await
            .unwrap();
        assert!(b.inserted);
        assert_ne!(a.entry.id, b.entry.id);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_entry_and_frees_fingerprint() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let saved = store.save(draft("hello", "你好"), now).await.unwrap();
        let id = saved.entry.id;

        assert!(store.soft_delete(id, now).await.unwrap());
        assert!(!store.soft_delete(id, now).await.unwrap());
        assert!(store.get_by_id(id).await.unwrap().is_none());
        assert_eq!(store.count_active().await.unwrap(), 0);

        let again = store.save(draft("hello", "你好"), now).await.unwrap();
        assert!(again.inserted);
        assert_ne!(again.entry.id, id);
    }

    #[tokio::test]
    async fn test_update_review_and_list_due_order() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let a = store.save(draft("alpha", "甲"), now).await.unwrap().entry.id;
        let b = store.save(draft("beta", "乙"), now).await.unwrap().entry.id;
        let c = store.save(draft("gamma", "丙"), now).await.unwrap().entry.id;

        let schedule = |next| ReviewUpdate {
            ease_factor: 2.5,
            interval_days: 1,
            next_review_at: next,
            proficiency: 20,
            reviewed_at: now,
            outcome: ReviewOutcome::Answered { correct: true },
        };

        assert!(store.update_review(a, &schedule(now - Duration::hours(1))).await.unwrap());
        assert!(store.update_review(c, &schedule(now + Duration::days(3))).await.unwrap());
        assert!(!store.update_review(999, &schedule(now)).await.unwrap());

        let due = store.list_due(now, None).await.unwrap();
        let ids: Vec<EntryId> = due.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![b, a]);

        let limited = store.list_due(now, Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, b);

        let reviewed = store.get_by_id(a).await.unwrap().unwrap();
        assert_eq!(reviewed.review.review_count, 1);
        assert_eq!(reviewed.review.correct_count, 1);

        let learning = store.list_by_proficiency(10, 30).await.unwrap();
        assert_eq!(learning.len(), 2);
    }

    #[tokio::test]
    async fn test_cache_upsert_touch_and_expiry() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let key = CacheKey::new("k1");

        let entry = CacheEntry::new(key.clone(), "hello", "你好", TranslatorType::LocalDict, 30, now);
        assert_eq!(store.upsert(entry.clone()).await.unwrap().hit_count, 1);
        assert_eq!(store.upsert(entry).await.unwrap().hit_count, 2);
        assert_eq!(store.touch(&key).await.unwrap().unwrap().hit_count, 3);
        assert!(store.touch(&CacheKey::new("missing")).await.unwrap().is_none());

        let stale = CacheEntry::new(CacheKey::new("k2"), "old", "旧", TranslatorType::Ai, 1, now);
        store.upsert(stale).await.unwrap();

        let removed = store.delete_expired(now + Duration::days(2)).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.cache_len(), 1);
        assert!(store.delete(&key).await.unwrap());
        assert_eq!(store.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_stats_increment_and_range() {
        let store = MemoryStore::new();
        let day1 = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        let delta = StatDelta {
            translation_count: 1,
            ..Default::default()
        };
        store.increment(day1, &delta).await.unwrap();
        store.increment(day2, &delta).await.unwrap();
        let stat = store.increment(day2, &delta).await.unwrap();
        assert_eq!(stat.translation_count, 2);

        let range = store.range(day1, day2).await.unwrap();
        assert_eq!(range.len(), 2);
        assert_eq!(range[0].date, day1);
        assert!(StatsRepository::get(&store, day1.pred_opt().unwrap())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unavailable_mode() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.count_active().await.is_err());
        assert!(CacheRepository::get(&store, &CacheKey::new("k")).await.is_err());

        store.set_unavailable(false);
        assert_eq!(store.count_active().await.unwrap(), 0);
    }
}
