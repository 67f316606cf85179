//! 翻译缓存条目

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use super::translation::TranslatorType;

/// 缓存键（规范化文本 + 后端 + 语言对 的指纹）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 缓存条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub source_text: String,
    pub translation: String,
    pub translator_type: TranslatorType,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// 命中次数，只增不减
    pub hit_count: u64,
}

impl CacheEntry {
    /// 首次写入，本次查询计为 1 次
    pub fn new(
        key: CacheKey,
        source_text: impl Into<String>,
        translation: impl Into<String>,
        translator_type: TranslatorType,
        ttl_days: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            source_text: source_text.into(),
            translation: translation.into(),
            translator_type,
            created_at: now,
            expires_at: expiry(now, ttl_days),
            hit_count: 1,
        }
    }

    /// 用新写入的内容刷新已有条目，触发刷新的查询同样计数
    pub fn refreshed(&self, incoming: &CacheEntry) -> Self {
        Self {
            key: self.key.clone(),
            source_text: incoming.source_text.clone(),
            translation: incoming.translation.clone(),
            translator_type: incoming.translator_type,
            created_at: incoming.created_at,
            expires_at: incoming.expires_at,
            hit_count: self.hit_count.saturating_add(1),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn record_hit(&mut self) {
        self.hit_count = self.hit_count.saturating_add(1);
    }
}

fn expiry(now: DateTime<Utc>, ttl_days: u32) -> DateTime<Utc> {
    now.checked_add_signed(Duration::days(i64::from(ttl_days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_counts_first_query() {
        let now = Utc::now();
        let entry = CacheEntry::new(
            CacheKey::new("k"),
            "hello",
            "你好",
            TranslatorType::LocalDict,
            30,
            now,
        );
        assert_eq!(entry.hit_count, 1);
        assert_eq!(entry.expires_at, now + Duration::days(30));
        assert!(!entry.is_expired(now + Duration::days(30)));
        assert!(entry.is_expired(now + Duration::days(30) + Duration::seconds(1)));
    }

    #[test]
    fn test_refreshed_increments_hits() {
        let now = Utc::now();
        let mut old = CacheEntry::new(CacheKey::new("k"), "hi", "嗨", TranslatorType::Ai, 1, now);
        old.hit_count = 5;
        let later = now + Duration::days(2);
        let incoming = CacheEntry::new(CacheKey::new("k"), "hi", "你好", TranslatorType::Ai, 1, later);

        let merged = old.refreshed(&incoming);
        assert_eq!(merged.hit_count, 6);
        assert_eq!(merged.translation, "你好");
        assert_eq!(merged.expires_at, later + Duration::days(1));
    }
}
