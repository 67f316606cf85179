//! 应用组合根 - 编排层
//!
//! 负责创建存储、后端注册表、路由和两个服务，并提供命令行入口使用的 `run`。

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{CacheRepository, EntryRepository, MemoryStore, StatsRepository};
use crate::orchestrator::{ReviewService, TranslationService};
use crate::services::{BackendRegistry, TranslationCache, TranslatorRouter};
use crate::utils::logging::log_startup;
use crate::utils::truncate_text;

/// 应用主结构
pub struct App {
    config: Arc<Config>,
    registry: Arc<BackendRegistry>,
    translation: TranslationService,
    review: ReviewService,
}

impl App {
    /// 使用内存存储初始化应用
    pub fn initialize(config: Config) -> AppResult<Self> {
        config.validate()?;
        log_startup(&config);

        let store = Arc::new(MemoryStore::new());
        let registry = BackendRegistry::new(config.translation.clone());

        Ok(Self::with_stores(
            config,
            registry,
            store.clone(),
            store.clone(),
            store,
        ))
    }

    /// 使用外部提供的存储和后端注册表组装应用
    pub fn with_stores(
        config: Config,
        registry: BackendRegistry,
        entries: Arc<dyn EntryRepository>,
        cache: Arc<dyn CacheRepository>,
        stats: Arc<dyn StatsRepository>,
    ) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(registry);
        let router = Arc::new(TranslatorRouter::new(&config.translation, registry.clone()));

        let translation = TranslationService::new(
            config.clone(),
            router,
            TranslationCache::new(cache),
            entries.clone(),
            stats.clone(),
        );
        let review = ReviewService::new(entries, stats);

        Self {
            config,
            registry,
            translation,
            review,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    pub fn translation(&self) -> &TranslationService {
        &self.translation
    }

    pub fn review(&self) -> &ReviewService {
        &self.review
    }

    /// 命令行入口：有参数时翻译，没有参数时输出复习概况
    pub async fn run(&self, texts: &[String]) -> AppResult<()> {
        if texts.is_empty() {
            self.print_review_status().await;
            return Ok(());
        }

        let target_lang = self.config.translation.default_target_lang.as_str();
        let results = self
            .translation
            .translate_batch(texts, None, target_lang, false)
            .await;

        for (text, result) in texts.iter().zip(results) {
            match result {
                Ok(result) => {
                    let tag = result
                        .translator_type
                        .map(|t| t.as_str())
                        .unwrap_or("unknown");
                    info!("{} → {} [{}]", truncate_text(text, 30), result.translation, tag);
                    if let Some(pronunciation) = &result.pronunciation {
                        info!("    🔊 {}", pronunciation);
                    }
                    for example in &result.examples {
                        info!("    📌 {}", example);
                    }
                }
                Err(e) => warn!("⚠️ {}: {}", truncate_text(text, 30), e),
            }
        }

        Ok(())
    }

    async fn print_review_status(&self) {
        let stats = self.review.get_review_statistics().await;
        let minutes = ReviewService::estimate_study_time(stats.due_count);

        info!("{}", "=".repeat(60));
        info!("📊 复习概况");
        info!(
            "   总词条: {} | 待复习: {} | 今日已复习: {} / 目标 {}",
            stats.total_count, stats.due_count, stats.reviewed_today, self.config.review.daily_goal
        );
        info!(
            "   已掌握: {} | 学习中: {} | 新词: {}",
            stats.mastered_count, stats.learning_count, stats.new_count
        );
        if stats.due_count > 0 {
            info!("   ⏱️ 预计需要 {} 分钟", minutes);
        }
        info!("{}", "=".repeat(60));
    }
}
