//! 翻译编排 - 编排层
//!
//! ## 流程
//!
//! ```text
//! 校验输入 → 语言检测 → 选择后端 → 查缓存 ─命中→ 返回
//!                                    ↓ 未命中
//!                              路由翻译（含降级）→ 写缓存 → 保存词条 → 更新统计
//! ```
//!
//! 降级结果（未收录提示、失败说明）直接返回，不缓存、不保存、不计入统计。

use chrono::{Local, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{EntryRepository, StatsRepository};
use crate::models::{
    BackendKind, CacheKey, NewEntry, StatDelta, TranslationContext, TranslationResult,
    VocabularyEntry,
};
use crate::services::{LanguageDetector, RouteOutcome, TranslationCache, TranslatorRouter};
use crate::utils::truncate_text;

/// 翻译服务
#[derive(Clone)]
pub struct TranslationService {
    config: Arc<Config>,
    router: Arc<TranslatorRouter>,
    cache: TranslationCache,
    entries: Arc<dyn EntryRepository>,
    stats: Arc<dyn StatsRepository>,
}

impl TranslationService {
    pub fn new(
        config: Arc<Config>,
        router: Arc<TranslatorRouter>,
        cache: TranslationCache,
        entries: Arc<dyn EntryRepository>,
        stats: Arc<dyn StatsRepository>,
    ) -> Self {
        Self {
            config,
            router,
            cache,
            entries,
            stats,
        }
    }

    /// 翻译文本
    ///
    /// # 参数
    /// - `text`: 待翻译文本
    /// - `source_lang`: 源语言，`None` 时自动检测
    /// - `target_lang`: 目标语言
    /// - `persist`: 是否保存为生词
    /// - `context`: 来源应用、URL、周边文本
    ///
    /// # 返回
    /// 翻译结果。只有输入为空或显式保存失败时返回错误，翻译失败以降级结果返回。
    pub async fn translate(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: &str,
        persist: bool,
        context: Option<&TranslationContext>,
    ) -> AppResult<TranslationResult> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::invalid_input("文本不能为空"));
        }

        let source_lang = match source_lang.map(str::trim).filter(|l| !l.is_empty()) {
            Some(lang) => lang.to_string(),
            None => LanguageDetector::detect(text),
        };

        let backend = self
            .router
            .choose_backend(text, &source_lang, self.config.translation.force_ai);
        let key = TranslationCache::fingerprint(text, backend, &source_lang, target_lang);

        // 1. 查缓存
        let mut cache_usable = self.config.cache.enabled;
        if cache_usable {
            match self.cache.get(&key, Utc::now()).await {
                Ok(Some(hit)) => {
                    info!("🎯 命中缓存: {}", truncate_text(text, 20));
                    let mut result = TranslationResult::new(
                        hit.translation,
                        &source_lang,
                        target_lang,
                        self.router.classify(text),
                    )
                    .with_translator(hit.translator_type);
                    result.from_cache = true;

                    self.persist_if_needed(text, &mut result, persist, hit.hit_count, context)
                        .await?;
                    return Ok(result);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("⚠️ 缓存不可用，跳过缓存: {}", e);
                    cache_usable = false;
                }
            }
        }

        // 2. 路由翻译
        info!("🔍 使用翻译后端: {} | 文本: {}", backend, truncate_text(text, 30));
        let started = Instant::now();
        let outcome = self
            .router
            .translate(text, &source_lang, target_lang, backend)
            .await;
        let elapsed = started.elapsed().as_secs_f64();

        let (mut result, produced_by) = match outcome {
            RouteOutcome::Translated { result, backend } => (result, backend),
            RouteOutcome::Degraded(mut result) => {
                result.translation_time = Some(elapsed);
                warn!("⚠️ 翻译降级: {}", truncate_text(&result.translation, 50));
                return Ok(result);
            }
        };
        result.translation_time = Some(elapsed);

        // 3. 写缓存
        let hit_count = if cache_usable {
            self.write_cache(key, text, &result).await
        } else {
            0
        };

        // 4. 保存词条
        self.persist_if_needed(text, &mut result, persist, hit_count, context)
            .await?;

        // 5. 更新统计
        self.record_translation(produced_by, &result).await;

        info!("✅ 翻译完成，耗时 {:.2}s", elapsed);
        Ok(result)
    }

    /// 批量翻译
    ///
    /// 并发数由 `performance.max_concurrent_translations` 控制，结果顺序与输入一致
    pub async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: Option<&str>,
        target_lang: &str,
        persist: bool,
    ) -> Vec<AppResult<TranslationResult>> {
        let concurrency = self.config.performance.max_concurrent_translations.max(1);
        info!("📦 批量翻译 {} 条，并发数 {}", texts.len(), concurrency);

        stream::iter(texts.iter())
            .map(|text| self.translate(text, source_lang, target_lang, persist, None))
            .buffered(concurrency)
            .collect()
            .await
    }

    /// 保存翻译结果为生词
    ///
    /// 已存在同指纹的词条时更新译文；新插入时计入当天新词数
    pub async fn save_entry(
        &self,
        text: &str,
        result: &TranslationResult,
        context: Option<&TranslationContext>,
    ) -> AppResult<VocabularyEntry> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::invalid_input("文本不能为空"));
        }
        if result.is_degraded() {
            return Err(AppError::invalid_input("翻译失败的结果不能保存"));
        }

        let draft = NewEntry::from_translation(text, result, context);
        let outcome = self.entries.save(draft, Utc::now()).await?;

        if outcome.inserted {
            info!("📝 新增生词 #{}: {}", outcome.entry.id, truncate_text(text, 30));
            self.bump_stats(StatDelta {
                new_words: 1,
                ..Default::default()
            })
            .await;
        } else {
            debug!("更新生词 #{}", outcome.entry.id);
        }

        Ok(outcome.entry)
    }

    /// 清理过期缓存
    pub async fn purge_expired_cache(&self) -> AppResult<usize> {
        let removed = self.cache.purge_expired(Utc::now()).await?;
        info!("🧹 清理过期缓存 {} 条", removed);
        Ok(removed)
    }

    async fn write_cache(&self, key: CacheKey, text: &str, result: &TranslationResult) -> u64 {
        let Some(translator_type) = result.translator_type else {
            return 0;
        };

        match self
            .cache
            .set(
                key,
                text,
                &result.translation,
                translator_type,
                self.config.cache.expire_days,
                Utc::now(),
            )
            .await
        {
            Ok(entry) => entry.hit_count,
            Err(e) => {
                warn!("⚠️ 保存缓存失败: {}", e);
                0
            }
        }
    }

    /// 显式保存或查询次数达到阈值时保存词条
    ///
    /// 显式保存失败返回错误；自动保存失败只记录日志
    async fn persist_if_needed(
        &self,
        text: &str,
        result: &mut TranslationResult,
        persist: bool,
        query_count: u64,
        context: Option<&TranslationContext>,
    ) -> AppResult<()> {
        let features = &self.config.features;
        let auto_save = features.auto_save && query_count >= features.auto_save_threshold;
        if !persist && !auto_save {
            return Ok(());
        }

        if auto_save && !persist {
            debug!("查询 {} 次，触发自动保存", query_count);
        }

        match self.save_entry(text, result, context).await {
            Ok(entry) => {
                result.entry_id = Some(entry.id);
                Ok(())
            }
            Err(e) if persist => Err(e),
            Err(e) => {
                warn!("⚠️ 自动保存失败: {}", e);
                Ok(())
            }
        }
    }

    async fn record_translation(&self, produced_by: BackendKind, result: &TranslationResult) {
        let mut delta = StatDelta {
            translation_count: 1,
            ..Default::default()
        };
        if produced_by == BackendKind::Ai {
            delta.ai_calls = 1;
            delta.ai_tokens = u64::from(result.tokens_used.unwrap_or(0));
        }
        self.bump_stats(delta).await;
    }

    async fn bump_stats(&self, delta: StatDelta) {
        let today = Local::now().date_naive();
        if let Err(e) = self.stats.increment(today, &delta).await {
            warn!("⚠️ 更新统计失败: {}", e);
        }
    }
}
