//! 翻译缓存 - 业务能力层
//!
//! 在 `CacheRepository` 之上实现缓存语义：
//! - 键为规范化文本 + 后端 + 语言对的 blake3 指纹
//! - 过期条目在读取时删除并视为未命中
//! - 命中和重复写入都会累加命中次数（自动保存依赖这个计数）

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::error::StorageResult;
use crate::infrastructure::CacheRepository;
use crate::models::{BackendKind, CacheEntry, CacheKey, TranslatorType};

/// 翻译缓存
#[derive(Clone)]
pub struct TranslationCache {
    repo: Arc<dyn CacheRepository>,
}

impl TranslationCache {
    pub fn new(repo: Arc<dyn CacheRepository>) -> Self {
        Self { repo }
    }

    /// 计算缓存键
    ///
    /// 文本先去除首尾空白并转小写，字段之间用 0 字节分隔
    pub fn fingerprint(
        text: &str,
        backend: BackendKind,
        source_lang: &str,
        target_lang: &str,
    ) -> CacheKey {
        let normalized = text.trim().to_lowercase();

        let mut hasher = blake3::Hasher::new();
        hasher.update(normalized.as_bytes());
        hasher.update(&[0]);
        hasher.update(backend.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(source_lang.as_bytes());
        hasher.update(&[0]);
        hasher.update(target_lang.as_bytes());

        CacheKey::new(hasher.finalize().to_hex().to_string())
    }

    /// 读取缓存
    ///
    /// 过期条目会被删除并返回 None；命中时命中次数 +1
    pub async fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> StorageResult<Option<CacheEntry>> {
        let Some(entry) = self.repo.get(key).await? else {
            return Ok(None);
        };

        if entry.is_expired(now) {
            debug!("缓存已过期，删除: {}", key);
            self.repo.delete(key).await?;
            return Ok(None);
        }

        self.repo.touch(key).await
    }

    /// 写入缓存
    ///
    /// 已存在时命中次数 +1 并刷新内容和过期时间，否则以命中次数 1 插入
    pub async fn set(
        &self,
        key: CacheKey,
        source_text: &str,
        translation: &str,
        translator_type: TranslatorType,
        ttl_days: u32,
        now: DateTime<Utc>,
    ) -> StorageResult<CacheEntry> {
        let entry = CacheEntry::new(key, source_text, translation, translator_type, ttl_days, now);
        self.repo.upsert(entry).await
    }

    /// 查看命中次数（无副作用）
    pub async fn hit_count(&self, key: &CacheKey) -> StorageResult<u64> {
        Ok(self.repo.get(key).await?.map_or(0, |e| e.hit_count))
    }

    /// 清理所有过期条目
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        let removed = self.repo.delete_expired(now).await?;
        if removed > 0 {
            debug!("清理过期缓存 {} 条", removed);
        }
        Ok(removed)
    }
}
